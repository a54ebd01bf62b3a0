use crate::config::DnsConfig;
use crate::dns::DNSPacket;
use crate::dns::enums::{DNSResourceType, ResultCode};
use crate::error::{DnsError, Result};
use crate::transport::{Transport, UdpTransport};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tracing::{debug, error, info, warn};

type LookupFuture<'a> = Pin<Box<dyn Future<Output = Result<DNSPacket>> + Send + 'a>>;

/// Source of transaction IDs for outgoing queries.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> u16;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> u16 {
        rand::random()
    }
}

/// Deterministic IDs, wrapping at u16::MAX.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU16,
}

impl SequentialIdGenerator {
    pub fn new(start: u16) -> Self {
        Self {
            next: AtomicU16::new(start),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> u16 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Iterative resolver that walks delegations down from a single root server.
///
/// All state is read-only after construction, so one instance is shared by
/// every in-flight query behind an `Arc`.
pub struct DnsResolver {
    config: DnsConfig,
    transport: Arc<dyn Transport>,
    ids: Arc<dyn IdGenerator>,
}

impl DnsResolver {
    pub fn new(config: DnsConfig) -> Self {
        let transport = Arc::new(UdpTransport::new(
            config.upstream_port,
            config.upstream_timeout,
        ));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: DnsConfig, transport: Arc<dyn Transport>) -> Self {
        info!(
            "Resolver starting from root server {} (port {}, timeout {:?})",
            config.root_server, config.upstream_port, config.upstream_timeout
        );
        Self {
            config,
            transport,
            ids: Arc::new(RandomIdGenerator),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &DnsConfig {
        &self.config
    }

    /// Answer a client query. Never fails: problems are reported through
    /// the response code.
    pub async fn resolve_query(&self, query: &DNSPacket) -> DNSPacket {
        let query_id = query.header.id;

        if let Err(e) = validate_query(query) {
            warn!("[{}] Rejecting query: {}", query_id, e);
            let mut response = response_for(query);
            response.header.rcode = ResultCode::FORMERR;
            return response;
        }

        let question = &query.questions[0];
        debug!("[{}] Received query {}", query_id, question);

        let lookup = match self
            .lookup_recursive(query_id, &question.name, question.qtype)
            .await
        {
            Ok(lookup) => lookup,
            Err(e) => {
                error!(
                    "[{}] Resolution of {} {} failed: {}",
                    query_id, question.qtype, question.name, e
                );
                return query.error_response(ResultCode::SERVFAIL);
            }
        };

        let mut response = response_for(query);
        // a completed chain is NOERROR, except that a missing name stays NXDOMAIN
        response.header.rcode = match lookup.header.rcode {
            ResultCode::NXDOMAIN => ResultCode::NXDOMAIN,
            _ => ResultCode::NOERROR,
        };
        response.add_question(question.clone());

        for record in lookup.answers {
            debug!("[{}] Answer {}", query_id, record);
            response.add_answer(record);
        }

        for record in lookup.authorities {
            debug!("[{}] Authority {}", query_id, record);
            response.add_authority(record);
        }

        for record in lookup.resources {
            debug!("[{}] Resource {}", query_id, record);
            response.add_resource(record);
        }

        info!(
            "[{}] Resolved {} {}: {} ({} answers)",
            query_id,
            question.qtype,
            question.name,
            response.header.rcode,
            response.answers.len()
        );
        response
    }

    /// Single round trip: ask `server` about `qname` with recursion desired.
    pub async fn lookup(
        &self,
        qname: &str,
        qtype: DNSResourceType,
        server: &str,
    ) -> Result<DNSPacket> {
        let query = DNSPacket::new_query(self.ids.next_id(), qname, qtype);
        let request = query.serialize()?;

        let raw = self.transport.send_receive(server, &request).await?;
        let response = DNSPacket::parse(&raw)?;

        if response.header.id != query.header.id {
            debug!(
                "Response from {} carries id {} for query id {}",
                server, response.header.id, query.header.id
            );
        }

        Ok(response)
    }

    /// Follow the delegation chain for `qname` starting at the root server.
    /// `query_id` only tags log lines.
    pub async fn lookup_recursive(
        &self,
        query_id: u16,
        qname: &str,
        qtype: DNSResourceType,
    ) -> Result<DNSPacket> {
        self.lookup_chain(query_id, qname, qtype, 0).await
    }

    fn lookup_chain<'a>(
        &'a self,
        query_id: u16,
        qname: &'a str,
        qtype: DNSResourceType,
        depth: usize,
    ) -> LookupFuture<'a> {
        Box::pin(async move {
            if let Some(max_depth) = self.config.max_depth {
                if depth > max_depth {
                    return Err(DnsError::ResolutionLimit(format!(
                        "name server lookups nested deeper than {} while resolving {}",
                        max_depth, qname
                    )));
                }
            }

            let mut ns = self.config.root_server.clone();
            let mut iteration = 0usize;

            loop {
                iteration += 1;
                if let Some(max_iterations) = self.config.max_iterations {
                    if iteration > max_iterations {
                        return Err(DnsError::ResolutionLimit(format!(
                            "more than {} delegation steps while resolving {}",
                            max_iterations, qname
                        )));
                    }
                }

                debug!(
                    "[{}] Attempting lookup of {} {} with ns {}",
                    query_id, qtype, qname, ns
                );

                let response = self.lookup(qname, qtype, &ns).await?;

                if !response.answers.is_empty() && response.header.rcode == ResultCode::NOERROR {
                    return Ok(response);
                }

                if response.header.rcode == ResultCode::NXDOMAIN {
                    debug!("[{}] {} does not exist", query_id, qname);
                    return Ok(response);
                }

                // glue for one of the delegated servers came along
                if let Some(addr) = response.resolved_ns(qname) {
                    debug!("[{}] Following referral to {}", query_id, addr);
                    ns = addr.to_string();
                    continue;
                }

                let Some(host) = response.unresolved_ns(qname).map(str::to_string) else {
                    debug!("[{}] No delegation for {}, giving up", query_id, qname);
                    return Ok(response);
                };

                debug!("[{}] Resolving name server {} first", query_id, host);
                let ns_response = self
                    .lookup_chain(query_id, &host, DNSResourceType::A, depth + 1)
                    .await?;

                match ns_response.first_a_record() {
                    Some(addr) => ns = addr.to_string(),
                    None => {
                        debug!("[{}] Name server {} has no address", query_id, host);
                        return Ok(response);
                    }
                }
            }
        })
    }
}

fn validate_query(query: &DNSPacket) -> Result<()> {
    if query.questions.is_empty() || query.header.qdcount == 0 {
        return Err(DnsError::ProtocolViolation(
            "query has no questions".to_string(),
        ));
    }
    if query.header.qr {
        return Err(DnsError::ProtocolViolation(
            "message is flagged as a response".to_string(),
        ));
    }
    Ok(())
}

/// Empty response skeleton echoing the query ID.
fn response_for(query: &DNSPacket) -> DNSPacket {
    let mut response = DNSPacket::default();
    response.header.id = query.header.id;
    response.header.qr = true;
    response.header.rd = true;
    response.header.ra = true;
    response
}
