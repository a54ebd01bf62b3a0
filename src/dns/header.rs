use std::fmt;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use super::{
    buffer::PacketBuffer,
    common::PacketComponent,
    enums::{Opcode, ResultCode},
};
use crate::error::Result;

/// The fixed 12-byte message header.
///
/// Flag bytes, bit 7 being the most significant:
///
/// | byte | bit 7 | bits 6-3 | bit 2 | bit 1 | bit 0 |
/// |------|-------|----------|-------|-------|-------|
/// | 1    | QR    | OPCODE   | AA    | TC    | RD    |
///
/// | byte | bit 7 | bit 6 | bit 5 | bit 4 | bits 3-0 |
/// |------|-------|-------|-------|-------|----------|
/// | 2    | RA    | Z/DO  | AD    | CD    | RCODE    |
///
/// The four counts are overwritten from the section lengths whenever a
/// [`DNSPacket`](super::DNSPacket) is serialized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: Opcode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    /// Reserved bit, carried as DNSSEC-OK.
    pub z: bool,
    pub ad: bool,
    pub cd: bool,
    pub rcode: ResultCode,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DNSHeader {
    pub const SIZE: usize = 12;

    pub fn pack_flags(&self) -> Result<[u8; 2]> {
        let mut flags = Vec::with_capacity(2);
        {
            let mut writer = BitWriter::<_, BigEndian>::new(&mut flags);

            writer.write_bit(self.qr)?;
            writer.write_var::<u8>(4, self.opcode.into())?;
            writer.write_bit(self.aa)?;
            writer.write_bit(self.tc)?;
            writer.write_bit(self.rd)?;

            writer.write_bit(self.ra)?;
            writer.write_bit(self.z)?;
            writer.write_bit(self.ad)?;
            writer.write_bit(self.cd)?;
            writer.write_var::<u8>(4, self.rcode.into())?;
        }

        Ok([flags[0], flags[1]])
    }

    pub fn unpack_flags(&mut self, flags: [u8; 2]) -> Result<()> {
        let mut reader = BitReader::<_, BigEndian>::new(&flags[..]);

        self.qr = reader.read_bit()?;
        self.opcode = reader.read_var::<u8>(4)?.into();
        self.aa = reader.read_bit()?;
        self.tc = reader.read_bit()?;
        self.rd = reader.read_bit()?;

        self.ra = reader.read_bit()?;
        self.z = reader.read_bit()?;
        self.ad = reader.read_bit()?;
        self.cd = reader.read_bit()?;
        self.rcode = reader.read_var::<u8>(4)?.into();

        Ok(())
    }
}

impl PacketComponent for DNSHeader {
    fn write(&self, buffer: &mut PacketBuffer) -> Result<()> {
        buffer.write_u16(self.id)?;
        buffer.write_bytes(&self.pack_flags()?)?;
        buffer.write_u16(self.qdcount)?;
        buffer.write_u16(self.ancount)?;
        buffer.write_u16(self.nscount)?;
        buffer.write_u16(self.arcount)?;
        Ok(())
    }

    fn read(&mut self, buffer: &mut PacketBuffer) -> Result<()> {
        self.id = buffer.read_u16()?;
        let flags = [buffer.read_u8()?, buffer.read_u8()?];
        self.qdcount = buffer.read_u16()?;
        self.ancount = buffer.read_u16()?;
        self.nscount = buffer.read_u16()?;
        self.arcount = buffer.read_u16()?;
        self.unpack_flags(flags)
    }
}

impl fmt::Display for DNSHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        for (set, name) in [
            (self.qr, "qr"),
            (self.aa, "aa"),
            (self.tc, "tc"),
            (self.rd, "rd"),
            (self.ra, "ra"),
            (self.z, "do"),
            (self.ad, "ad"),
            (self.cd, "cd"),
        ] {
            if set {
                flags.push(name);
            }
        }

        write!(
            f,
            "opcode: {}, status: {}, id: {}, flags: [{}]; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            self.opcode,
            self.rcode,
            self.id,
            flags.join(" "),
            self.qdcount,
            self.ancount,
            self.nscount,
            self.arcount
        )
    }
}
