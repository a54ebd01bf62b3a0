pub mod buffer;
pub mod common;
pub mod enums;
pub mod header;
pub mod question;
pub mod resource;


use std::fmt;
use std::net::Ipv4Addr;

pub use buffer::{MAX_PACKET_SIZE, PacketBuffer};
use common::PacketComponent;
use enums::{DNSResourceType, ResultCode};
use header::DNSHeader;
use question::DNSQuestion;
use resource::DNSResource;
use tracing::{debug, trace};

use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    /// Additional section.
    pub resources: Vec<DNSResource>,
}

/// Presentation form of a name: trailing dot, `.` for the root.
pub(crate) fn fqdn(name: &str) -> String {
    if name.is_empty() {
        ".".to_string()
    } else {
        format!("{}.", name)
    }
}

impl DNSPacket {
    /// A single-question query with recursion desired.
    pub fn new_query(id: u16, name: &str, qtype: DNSResourceType) -> Self {
        let mut packet = DNSPacket::default();
        packet.header.id = id;
        packet.header.rd = true;
        packet.add_question(DNSQuestion::new(name, qtype));
        packet
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        trace!("Parsing DNS packet, size: {} bytes", buf.len());
        let mut buffer = PacketBuffer::from_bytes(buf)?;
        Self::read(&mut buffer)
    }

    /// Decode a whole message. The first error aborts the message; nothing
    /// partially decoded is returned.
    pub fn read(buffer: &mut PacketBuffer) -> Result<Self> {
        let mut packet = DNSPacket::default();
        packet.header.read(buffer)?;
        debug!(
            "Parsed DNS header: id={}, qr={}, opcode={}, questions={}",
            packet.header.id, packet.header.qr, packet.header.opcode, packet.header.qdcount
        );

        for _ in 0..packet.header.qdcount {
            let mut question = DNSQuestion::default();
            question.read(buffer)?;
            packet.questions.push(question);
        }

        for _ in 0..packet.header.ancount {
            let mut answer = DNSResource::default();
            answer.read(buffer)?;
            packet.answers.push(answer);
        }

        for _ in 0..packet.header.nscount {
            let mut authority = DNSResource::default();
            authority.read(buffer)?;
            packet.authorities.push(authority);
        }

        for _ in 0..packet.header.arcount {
            let mut resource = DNSResource::default();
            resource.read(buffer)?;
            packet.resources.push(resource);
        }

        Ok(packet)
    }

    /// Encode the message. Header counts are taken from the section lengths,
    /// whatever the stored header says.
    pub fn write(&self, buffer: &mut PacketBuffer) -> Result<()> {
        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.resources.len() as u16;

        header.write(buffer)?;

        for question in &self.questions {
            question.write(buffer)?;
        }

        for answer in &self.answers {
            answer.write(buffer)?;
        }

        for authority in &self.authorities {
            authority.write(buffer)?;
        }

        for resource in &self.resources {
            resource.write(buffer)?;
        }

        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buffer = PacketBuffer::new();
        self.write(&mut buffer)?;
        Ok(buffer.bytes().to_vec())
    }

    pub fn add_question(&mut self, question: DNSQuestion) {
        self.questions.push(question);
        self.header.qdcount += 1;
    }

    pub fn add_answer(&mut self, record: DNSResource) {
        self.answers.push(record);
        self.header.ancount += 1;
    }

    pub fn add_authority(&mut self, record: DNSResource) {
        self.authorities.push(record);
        self.header.nscount += 1;
    }

    pub fn add_resource(&mut self, record: DNSResource) {
        self.resources.push(record);
        self.header.arcount += 1;
    }

    /// Turn a query into an empty response carrying `rcode`. ID, flags and
    /// questions are kept; record sections are dropped.
    pub fn error_response(&self, rcode: ResultCode) -> Self {
        let mut response = self.clone();
        response.header.qr = true;
        response.header.ra = true;
        response.header.rcode = rcode;

        response.answers.clear();
        response.authorities.clear();
        response.resources.clear();
        response.header.qdcount = response.questions.len() as u16;
        response.header.ancount = 0;
        response.header.nscount = 0;
        response.header.arcount = 0;

        response
    }

    /// NS records in the authority section whose owner is a suffix of
    /// `qname`. This is a plain string suffix, not a label-aligned one.
    pub fn authority_name_servers<'a>(
        &'a self,
        qname: &str,
    ) -> impl Iterator<Item = &'a DNSResource> {
        self.authorities
            .iter()
            .filter(move |record| record.ns_host().is_some() && qname.ends_with(&record.name))
    }

    /// Glue address for a delegation of `qname`: the first additional A
    /// record owned by one of the delegated hosts, in NS order.
    pub fn resolved_ns(&self, qname: &str) -> Option<Ipv4Addr> {
        self.authority_name_servers(qname)
            .filter_map(|ns| ns.ns_host())
            .find_map(|host| {
                self.resources
                    .iter()
                    .find(|record| record.name == host && record.ipv4().is_some())
                    .and_then(|record| record.ipv4())
            })
    }

    /// Host of the first delegation NS record for `qname`.
    pub fn unresolved_ns(&self, qname: &str) -> Option<&str> {
        self.authority_name_servers(qname)
            .find_map(|ns| ns.ns_host())
    }

    pub fn first_a_record(&self) -> Option<Ipv4Addr> {
        self.answers.iter().find_map(|record| record.ipv4())
    }
}

impl fmt::Display for DNSPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; {}", self.header)?;

        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            writeln!(f, ";{}", question)?;
        }

        for (title, records) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authorities),
            ("ADDITIONAL", &self.resources),
        ] {
            if records.is_empty() {
                continue;
            }
            writeln!(f, ";; {} SECTION:", title)?;
            for record in records {
                writeln!(f, "{}", record)?;
            }
        }

        Ok(())
    }
}
