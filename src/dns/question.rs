use std::fmt;

use super::{
    buffer::PacketBuffer,
    common::PacketComponent,
    enums::{DNSResourceClass, DNSResourceType},
    fqdn,
};
use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    /// Dot-joined labels, case preserved, no trailing dot.
    pub name: String,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(name: impl Into<String>, qtype: DNSResourceType) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }
}

impl PacketComponent for DNSQuestion {
    fn write(&self, buffer: &mut PacketBuffer) -> Result<()> {
        buffer.write_name(&self.name)?;
        buffer.write_u16(self.qtype.into())?;
        buffer.write_u16(self.qclass.into())?;
        Ok(())
    }

    fn read(&mut self, buffer: &mut PacketBuffer) -> Result<()> {
        let name = buffer.read_name()?;
        let qtype = buffer.read_u16()?.into();
        let qclass = buffer.read_u16()?.into();
        *self = DNSQuestion {
            name,
            qtype,
            qclass,
        };
        Ok(())
    }
}

impl fmt::Display for DNSQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", fqdn(&self.name), self.qclass, self.qtype)
    }
}
