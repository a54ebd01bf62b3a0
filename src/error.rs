use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid root server: {0}")]
    InvalidRootServer(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("Buffer overflow: tried to access {len} byte(s) at position {pos} of 512")]
    BufferBounds { pos: usize, len: usize },

    #[error("Malformed label: {0}")]
    MalformedLabel(String),

    #[error("Label too long: {0} bytes (max 63)")]
    LabelTooLong(usize),

    #[error("Invalid {rtype} record data: expected {expected} bytes, got {actual}")]
    InvalidRecordData {
        rtype: String,
        expected: u16,
        actual: u16,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream query timeout")]
    Timeout,

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Resolution limit reached: {0}")]
    ResolutionLimit(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        DnsError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;
