use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::dns::MAX_PACKET_SIZE;
use crate::error::{DnsError, Result};

/// One request/response round trip against a name server.
///
/// `server` is whatever the resolver currently points at: the configured
/// root (hostname or IP literal) or an address learned from a referral.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_receive(&self, server: &str, request: &[u8]) -> Result<Vec<u8>>;
}

/// Plain UDP, one datagram out and one back, no retries.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    port: u16,
    timeout: Duration,
}

impl UdpTransport {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    async fn resolve_addr(&self, server: &str) -> Result<SocketAddr> {
        if let Ok(ip) = server.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        lookup_host((server, self.port))
            .await
            .map_err(|e| DnsError::Transport(format!("cannot resolve {}: {}", server, e)))?
            .next()
            .ok_or_else(|| DnsError::Transport(format!("no address for {}", server)))
    }

    async fn exchange(&self, server_addr: SocketAddr, request: &[u8]) -> Result<Vec<u8>> {
        let local: SocketAddr = match server_addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;
        socket
            .connect(server_addr)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;

        socket
            .send(request)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;

        let mut response_buf = [0u8; MAX_PACKET_SIZE];
        let response_len = socket
            .recv(&mut response_buf)
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;

        trace!(
            "Raw UDP response data ({} bytes): {:02x?}",
            response_len,
            &response_buf[..response_len.min(64)]
        );

        Ok(response_buf[..response_len].to_vec())
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_receive(&self, server: &str, request: &[u8]) -> Result<Vec<u8>> {
        let server_addr = self.resolve_addr(server).await?;
        debug!("Sending {} byte query to {}", request.len(), server_addr);

        timeout(self.timeout, self.exchange(server_addr, request))
            .await
            .map_err(|_| DnsError::Timeout)?
    }
}
