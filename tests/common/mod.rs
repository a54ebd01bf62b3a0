//! Shared helpers for walkdns integration tests: packet builders and a
//! scripted in-memory transport.

#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use walkdns::{
    DnsError, Result,
    config::DnsConfig,
    dns::{
        DNSPacket,
        enums::{DNSResourceType, ResultCode},
        resource::{DNSResource, DNSResourceData},
    },
    resolver::{DnsResolver, SequentialIdGenerator},
    transport::Transport,
};

pub const ROOT: &str = "198.41.0.4";

/// Create a basic test DNS query packet
pub fn create_test_query(domain: &str, qtype: DNSResourceType) -> DNSPacket {
    DNSPacket::new_query(1234, domain, qtype)
}

pub fn a_record(name: &str, addr: Ipv4Addr) -> DNSResource {
    DNSResource::new(name, 300, DNSResourceData::A(addr))
}

pub fn ns_record(owner: &str, host: &str) -> DNSResource {
    DNSResource::new(owner, 172800, DNSResourceData::NS(host.to_string()))
}

/// Response carrying a single A answer.
pub fn answer(name: &str, addr: Ipv4Addr) -> DNSPacket {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.header.aa = true;
    packet.add_answer(a_record(name, addr));
    packet
}

/// Delegation of `owner` to `host`, with glue when `glue` is set.
pub fn referral(owner: &str, host: &str, glue: Option<Ipv4Addr>) -> DNSPacket {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.add_authority(ns_record(owner, host));
    if let Some(addr) = glue {
        packet.add_resource(a_record(host, addr));
    }
    packet
}

pub fn nxdomain() -> DNSPacket {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.header.aa = true;
    packet.header.rcode = ResultCode::NXDOMAIN;
    packet
}

#[derive(Debug, Clone)]
enum Reply {
    Packet(DNSPacket),
    Raw(Vec<u8>),
    Fail(DnsError),
}

type ScriptKey = (String, String, DNSResourceType);

/// Transport answering from a fixed script keyed by server, name and type.
/// Replies echo the request ID and question; unscripted exchanges fail.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<HashMap<ScriptKey, Reply>>,
    calls: Mutex<Vec<ScriptKey>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, server: &str, qname: &str, qtype: DNSResourceType, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .insert((server.to_string(), qname.to_string(), qtype), reply);
    }

    pub fn on(&self, server: &str, qname: &str, qtype: DNSResourceType, response: DNSPacket) {
        self.insert(server, qname, qtype, Reply::Packet(response));
    }

    /// Reply with bytes sent exactly as given.
    pub fn on_raw(&self, server: &str, qname: &str, qtype: DNSResourceType, bytes: Vec<u8>) {
        self.insert(server, qname, qtype, Reply::Raw(bytes));
    }

    pub fn fail(&self, server: &str, qname: &str, qtype: DNSResourceType, error: DnsError) {
        self.insert(server, qname, qtype, Reply::Fail(error));
    }

    /// Every exchange attempted so far, in order.
    pub fn calls(&self) -> Vec<(String, String, DNSResourceType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_receive(&self, server: &str, request: &[u8]) -> Result<Vec<u8>> {
        let query = DNSPacket::parse(request)?;
        let question = &query.questions[0];
        let key = (server.to_string(), question.name.clone(), question.qtype);
        self.calls.lock().unwrap().push(key.clone());

        let reply = self.script.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Packet(mut response)) => {
                response.header.id = query.header.id;
                response.header.qr = true;
                response.questions = query.questions.clone();
                response.serialize()
            }
            Some(Reply::Raw(bytes)) => Ok(bytes),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(DnsError::Transport(format!(
                "no scripted reply for {} {} at {}",
                question.qtype, question.name, server
            ))),
        }
    }
}

pub fn resolver_with(transport: Arc<MockTransport>) -> DnsResolver {
    resolver_with_config(DnsConfig::default(), transport)
}

pub fn resolver_with_config(config: DnsConfig, transport: Arc<MockTransport>) -> DnsResolver {
    DnsResolver::with_transport(config, transport)
        .with_id_generator(Arc::new(SequentialIdGenerator::new(100)))
}
