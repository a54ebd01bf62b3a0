use crate::{
    config::DnsConfig,
    dns::{
        DNSPacket, MAX_PACKET_SIZE, PacketBuffer, common::PacketComponent, enums::ResultCode,
        header::DNSHeader,
    },
    resolver::DnsResolver,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Run UDP server with graceful shutdown support
pub async fn run_udp_server(
    config: DnsConfig,
    resolver: Arc<DnsResolver>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sock: Arc<UdpSocket> = Arc::new(UdpSocket::bind(config.bind_addr).await?);
    info!("UDP DNS server listening on {}", sock.local_addr()?);

    serve(sock, resolver, &mut shutdown_rx).await
}

/// Receive loop over an already bound socket.
pub async fn serve(
    sock: Arc<UdpSocket>,
    resolver: Arc<DnsResolver>,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // one spare byte tells an oversized datagram apart from a full one
    let mut buf = [0u8; MAX_PACKET_SIZE + 1];

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("UDP server received shutdown signal");
                break;
            }

            result = sock.recv_from(&mut buf) => {
                let (read_bytes, src_addr) = result?;

                if read_bytes > MAX_PACKET_SIZE {
                    warn!("Dropping oversized datagram from {}", src_addr);
                    continue;
                }

                let query_data = buf[..read_bytes].to_vec();
                let resolver_clone = resolver.clone();
                let sock_clone = sock.clone();

                tokio::spawn(async move {
                    let response = handle_datagram(&query_data, &resolver_clone, src_addr).await;
                    let Some(response) = response else {
                        return;
                    };

                    if let Err(e) = sock_clone.send_to(&response, src_addr).await {
                        error!("Failed to send UDP response to {}: {:?}", src_addr, e);
                    }
                });
            }
        }
    }

    info!("UDP server shutdown complete");
    Ok(())
}

/// Bytes to send back for one inbound datagram, or None when nothing
/// sensible can be answered.
pub async fn handle_datagram(
    query_data: &[u8],
    resolver: &DnsResolver,
    src_addr: SocketAddr,
) -> Option<Vec<u8>> {
    let query = match DNSPacket::parse(query_data) {
        Ok(query) => query,
        Err(e) => {
            debug!("Malformed UDP packet from {}: {}", src_addr, e);
            return formerr_from_header(query_data);
        }
    };

    let response = resolver.resolve_query(&query).await;
    match response.serialize() {
        Ok(data) => Some(data),
        Err(e) => {
            error!(
                "[{}] Failed to serialize response: {}",
                query.header.id, e
            );
            query.error_response(ResultCode::SERVFAIL).serialize().ok()
        }
    }
}

/// FORMERR built from whatever header could still be read.
fn formerr_from_header(query_data: &[u8]) -> Option<Vec<u8>> {
    if query_data.len() < DNSHeader::SIZE {
        return None;
    }

    let mut buffer = PacketBuffer::from_bytes(query_data).ok()?;
    let mut header = DNSHeader::default();
    header.read(&mut buffer).ok()?;

    let mut response = DNSPacket::default();
    response.header.id = header.id;
    response.header.opcode = header.opcode;
    response.header.rd = header.rd;
    response.header.qr = true;
    response.header.ra = true;
    response.header.rcode = ResultCode::FORMERR;
    response.serialize().ok()
}
