use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::trace;

use super::{
    buffer::PacketBuffer,
    common::PacketComponent,
    enums::{DNSResourceClass, DNSResourceType},
    fqdn,
};
use crate::error::{DnsError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    pub name: String,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdata: DNSResourceData,
}

/// Type-specific payload. The record type is implied by the variant; the
/// declared rdata length is recomputed on every write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DNSResourceData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    CNAME(String),
    NS(String),
    MX {
        priority: u16,
        host: String,
    },
    SOA {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    /// Any type without a payload parser, kept byte for byte. `rtype`
    /// never names a parsed type; build values with
    /// [`DNSResourceData::opaque`] to keep it that way.
    Unknown { rtype: u16, data: Vec<u8> },
}

impl Default for DNSResourceData {
    fn default() -> Self {
        DNSResourceData::Unknown {
            rtype: 0,
            data: Vec::new(),
        }
    }
}

impl DNSResourceData {
    /// Payload from a type code and raw rdata. Types that have their own
    /// variant are decoded into it, so the result reads back unchanged.
    pub fn opaque(rtype: u16, data: Vec<u8>) -> Result<Self> {
        let rtype = DNSResourceType::from(rtype);
        if !has_parser(rtype) {
            return Ok(DNSResourceData::Unknown {
                rtype: rtype.into(),
                data,
            });
        }

        let rdlength = u16::try_from(data.len()).map_err(|_| DnsError::BufferBounds {
            pos: 0,
            len: data.len(),
        })?;
        let mut buffer = PacketBuffer::from_bytes(&data)?;
        read_rdata(&mut buffer, rtype, rdlength)
    }
}

impl DNSResource {
    pub fn new(name: impl Into<String>, ttl: u32, rdata: DNSResourceData) -> Self {
        Self {
            name: name.into(),
            rclass: DNSResourceClass::IN,
            ttl,
            rdata,
        }
    }

    pub fn rtype(&self) -> DNSResourceType {
        match &self.rdata {
            DNSResourceData::A(_) => DNSResourceType::A,
            DNSResourceData::AAAA(_) => DNSResourceType::AAAA,
            DNSResourceData::CNAME(_) => DNSResourceType::CNAME,
            DNSResourceData::NS(_) => DNSResourceType::NS,
            DNSResourceData::MX { .. } => DNSResourceType::MX,
            DNSResourceData::SOA { .. } => DNSResourceType::SOA,
            DNSResourceData::Unknown { rtype, .. } => DNSResourceType::from(*rtype),
        }
    }

    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self.rdata {
            DNSResourceData::A(addr) => Some(addr),
            _ => None,
        }
    }

    /// Target host of an NS record.
    pub fn ns_host(&self) -> Option<&str> {
        match &self.rdata {
            DNSResourceData::NS(host) => Some(host),
            _ => None,
        }
    }
}

fn expect_rdlength(rtype: DNSResourceType, expected: u16, actual: u16) -> Result<()> {
    if expected != actual {
        return Err(DnsError::InvalidRecordData {
            rtype: rtype.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

impl PacketComponent for DNSResource {
    fn write(&self, buffer: &mut PacketBuffer) -> Result<()> {
        buffer.write_name(&self.name)?;
        buffer.write_u16(self.rtype().into())?;
        buffer.write_u16(self.rclass.into())?;
        buffer.write_u32(self.ttl)?;

        match &self.rdata {
            DNSResourceData::A(addr) => {
                buffer.write_u16(4)?;
                buffer.write_bytes(&addr.octets())?;
            }
            DNSResourceData::AAAA(addr) => {
                buffer.write_u16(16)?;
                buffer.write_bytes(&addr.octets())?;
            }
            DNSResourceData::CNAME(host) | DNSResourceData::NS(host) => {
                buffer.write_length_prefixed(|buf| buf.write_name(host))?;
            }
            DNSResourceData::MX { priority, host } => {
                buffer.write_length_prefixed(|buf| {
                    buf.write_u16(*priority)?;
                    buf.write_name(host)
                })?;
            }
            DNSResourceData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                buffer.write_length_prefixed(|buf| {
                    buf.write_name(mname)?;
                    buf.write_name(rname)?;
                    buf.write_u32(*serial)?;
                    buf.write_u32(*refresh)?;
                    buf.write_u32(*retry)?;
                    buf.write_u32(*expire)?;
                    buf.write_u32(*minimum)
                })?;
            }
            DNSResourceData::Unknown { rtype, data } => {
                if has_parser(DNSResourceType::from(*rtype)) {
                    return Err(DnsError::ProtocolViolation(format!(
                        "{} payload stored as opaque data",
                        DNSResourceType::from(*rtype)
                    )));
                }
                buffer.write_u16(data.len() as u16)?;
                buffer.write_bytes(data)?;
            }
        }

        Ok(())
    }

    fn read(&mut self, buffer: &mut PacketBuffer) -> Result<()> {
        let name = buffer.read_name()?;
        let rtype = DNSResourceType::from(buffer.read_u16()?);
        let rclass = buffer.read_u16()?.into();
        let ttl = buffer.read_u32()?;
        let rdlength = buffer.read_u16()?;

        trace!("Reading {} record for {} ({} bytes of rdata)", rtype, name, rdlength);

        let rdata = read_rdata(buffer, rtype, rdlength)?;

        *self = DNSResource {
            name,
            rclass,
            ttl,
            rdata,
        };
        Ok(())
    }
}

/// Types decoded into their own [`DNSResourceData`] variant.
fn has_parser(rtype: DNSResourceType) -> bool {
    matches!(
        rtype,
        DNSResourceType::A
            | DNSResourceType::AAAA
            | DNSResourceType::CNAME
            | DNSResourceType::NS
            | DNSResourceType::MX
            | DNSResourceType::SOA
    )
}

/// Decode `rdlength` bytes of payload at the cursor and leave the cursor
/// exactly on the declared end.
fn read_rdata(
    buffer: &mut PacketBuffer,
    rtype: DNSResourceType,
    rdlength: u16,
) -> Result<DNSResourceData> {
    let start = buffer.pos();

    let rdata = match rtype {
        DNSResourceType::A => {
            expect_rdlength(rtype, 4, rdlength)?;
            let bytes = buffer.read_bytes(4)?;
            DNSResourceData::A(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]))
        }
        DNSResourceType::AAAA => {
            expect_rdlength(rtype, 16, rdlength)?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buffer.read_bytes(16)?);
            DNSResourceData::AAAA(Ipv6Addr::from(octets))
        }
        DNSResourceType::CNAME => DNSResourceData::CNAME(buffer.read_name()?),
        DNSResourceType::NS => DNSResourceData::NS(buffer.read_name()?),
        DNSResourceType::MX => {
            let priority = buffer.read_u16()?;
            let host = buffer.read_name()?;
            DNSResourceData::MX { priority, host }
        }
        DNSResourceType::SOA => DNSResourceData::SOA {
            mname: buffer.read_name()?,
            rname: buffer.read_name()?,
            serial: buffer.read_u32()?,
            refresh: buffer.read_u32()?,
            retry: buffer.read_u32()?,
            expire: buffer.read_u32()?,
            minimum: buffer.read_u32()?,
        },
        other => DNSResourceData::Unknown {
            rtype: other.into(),
            data: buffer.read_bytes(rdlength as usize)?,
        },
    };

    // Name-bearing payloads may end early when a pointer is involved;
    // land exactly on the declared end either way.
    let consumed = buffer.pos() - start;
    let declared = rdlength as usize;
    if consumed > declared {
        return Err(DnsError::InvalidRecordData {
            rtype: rtype.to_string(),
            expected: rdlength,
            actual: consumed as u16,
        });
    }
    buffer.step(declared - consumed)?;

    Ok(rdata)
}

impl fmt::Display for DNSResourceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DNSResourceData::A(addr) => write!(f, "{}", addr),
            DNSResourceData::AAAA(addr) => write!(f, "{}", addr),
            DNSResourceData::CNAME(host) | DNSResourceData::NS(host) => {
                write!(f, "{}", fqdn(host))
            }
            DNSResourceData::MX { priority, host } => write!(f, "{} {}", priority, fqdn(host)),
            DNSResourceData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{} {} {} {} {} {} {}",
                fqdn(mname),
                fqdn(rname),
                serial,
                refresh,
                retry,
                expire,
                minimum
            ),
            DNSResourceData::Unknown { data, .. } => {
                write!(f, "\\# {}", data.len())?;
                if !data.is_empty() {
                    write!(f, " ")?;
                    for byte in data {
                        write!(f, "{:02x}", byte)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for DNSResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            fqdn(&self.name),
            self.ttl,
            self.rclass,
            self.rtype(),
            self.rdata
        )
    }
}
