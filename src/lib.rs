pub mod config;
pub mod dns;
pub mod error;
pub mod resolver;
pub mod server;
pub mod transport;

pub use dns::DNSPacket;
pub use error::{DnsError, Result};
pub use resolver::DnsResolver;
