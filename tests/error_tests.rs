use std::error::Error as StdError;
use std::io;
use walkdns::error::{ConfigError, DnsError, Result};

#[test]
fn test_config_error_display() {
    let cases = vec![
        (
            ConfigError::InvalidBindAddress("127.0.0.1:999999".to_string()),
            "Invalid bind address: 127.0.0.1:999999",
        ),
        (
            ConfigError::InvalidRootServer("".to_string()),
            "Invalid root server: ",
        ),
        (
            ConfigError::InvalidTimeout("0ms".to_string()),
            "Invalid timeout: 0ms",
        ),
        (
            ConfigError::ParseError("unexpected EOF".to_string()),
            "Parse error: unexpected EOF",
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.to_string(), expected);
    }
}

#[test]
fn test_config_error_std_error_impl() {
    let error = ConfigError::InvalidBindAddress("test".to_string());
    // Verify it implements std::error::Error
    let _: &dyn StdError = &error;
}

#[test]
fn test_dns_error_display() {
    let cases = vec![
        (
            DnsError::BufferBounds { pos: 510, len: 4 },
            "Buffer overflow: tried to access 4 byte(s) at position 510 of 512",
        ),
        (
            DnsError::MalformedLabel("exceeded the limit of 5 jumps while reading name".to_string()),
            "Malformed label: exceeded the limit of 5 jumps while reading name",
        ),
        (
            DnsError::LabelTooLong(70),
            "Label too long: 70 bytes (max 63)",
        ),
        (
            DnsError::InvalidRecordData {
                rtype: "A".to_string(),
                expected: 4,
                actual: 3,
            },
            "Invalid A record data: expected 4 bytes, got 3",
        ),
        (
            DnsError::Transport("connection refused".to_string()),
            "Transport error: connection refused",
        ),
        (DnsError::Timeout, "Upstream query timeout"),
        (
            DnsError::ProtocolViolation("query has no questions".to_string()),
            "Protocol violation: query has no questions",
        ),
        (
            DnsError::ResolutionLimit("too deep".to_string()),
            "Resolution limit reached: too deep",
        ),
        (
            DnsError::Io("connection refused".to_string()),
            "IO error: connection refused",
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.to_string(), expected);
    }
}

#[test]
fn test_dns_error_has_no_source() {
    assert!(DnsError::Timeout.source().is_none());
    assert!(DnsError::Io("test".to_string()).source().is_none());
    assert!(DnsError::MalformedLabel("test".to_string()).source().is_none());
}

#[test]
fn test_dns_error_from_io_error() {
    let io_error = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
    let dns_error: DnsError = io_error.into();

    match dns_error {
        DnsError::Io(msg) => assert!(msg.contains("connection refused")),
        _ => panic!("Expected DnsError::Io"),
    }
}

#[test]
fn test_result_type_alias() {
    fn success_fn() -> Result<String> {
        Ok("success".to_string())
    }

    fn error_fn() -> Result<String> {
        Err(DnsError::Timeout)
    }

    assert_eq!(success_fn().unwrap(), "success");

    match error_fn() {
        Err(DnsError::Timeout) => (),
        _ => panic!("Expected timeout error"),
    }
}

#[test]
fn test_error_clone_and_eq() {
    let config_error = ConfigError::InvalidBindAddress("test".to_string());
    assert_eq!(config_error.clone(), config_error);

    let dns_error = DnsError::BufferBounds { pos: 1, len: 2 };
    assert_eq!(dns_error.clone(), dns_error);
    assert_ne!(dns_error, DnsError::BufferBounds { pos: 1, len: 3 });
}

#[test]
fn test_error_debug() {
    let config_error = ConfigError::InvalidBindAddress("test".to_string());
    let debug_str = format!("{:?}", config_error);
    assert!(debug_str.contains("InvalidBindAddress"));
    assert!(debug_str.contains("test"));

    let dns_error = DnsError::Timeout;
    let debug_str = format!("{:?}", dns_error);
    assert!(debug_str.contains("Timeout"));
}
