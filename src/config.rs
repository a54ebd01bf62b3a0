use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// a.root-servers.net
pub const DEFAULT_ROOT_SERVER: &str = "198.41.0.4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsConfig {
    /// Whether the UDP listener is started at all
    pub udp_enabled: bool,

    /// Address to bind the UDP listener to
    pub bind_addr: SocketAddr,

    /// Server every resolution chain starts from (hostname or IP literal)
    pub root_server: String,

    /// Port used when talking to upstream name servers
    pub upstream_port: u16,

    /// Timeout for a single upstream exchange
    pub upstream_timeout: Duration,

    /// Ceiling on delegation steps within one chain (None = unbounded)
    pub max_iterations: Option<usize>,

    /// Ceiling on nested name-server lookups (None = unbounded)
    pub max_depth: Option<usize>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            udp_enabled: true,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8053),
            root_server: DEFAULT_ROOT_SERVER.to_string(),
            upstream_port: 53,
            upstream_timeout: Duration::from_secs(5),
            max_iterations: None,
            max_depth: None,
        }
    }
}

impl DnsConfig {
    /// Create a DnsConfig from environment variables
    /// Returns Err if critical configuration is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DnsConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(udp_enabled) = lookup("WALKDNS_UDP_ENABLED") {
            config.udp_enabled = parse_bool(&udp_enabled, true);
        }

        if let Some(ip) = lookup("WALKDNS_UDP_IP") {
            let ip = ip
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidBindAddress(ip))?;
            config.bind_addr.set_ip(ip);
        }

        if let Some(port) = lookup("WALKDNS_UDP_PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidBindAddress(format!("invalid port {}", port)))?;
            config.bind_addr.set_port(port);
        }

        if let Some(root_server) = lookup("WALKDNS_ROOT_SERVER") {
            config.root_server = root_server.trim().to_string();
        }

        if let Some(port) = lookup("WALKDNS_UPSTREAM_PORT") {
            config.upstream_port = port.parse::<u16>().map_err(|_| {
                ConfigError::ParseError(format!("Invalid upstream port: {}", port))
            })?;
        }

        if let Some(timeout_str) = lookup("WALKDNS_UPSTREAM_TIMEOUT") {
            let timeout_secs = timeout_str
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(timeout_str.clone()))?;
            config.upstream_timeout = Duration::from_secs(timeout_secs);
        }

        if let Some(max_iterations) = lookup("WALKDNS_MAX_ITERATIONS") {
            config.max_iterations = parse_limit(&max_iterations, "max iterations")?;
        }

        if let Some(max_depth) = lookup("WALKDNS_MAX_DEPTH") {
            config.max_depth = parse_limit(&max_depth, "max depth")?;
        }

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_server.is_empty() || self.root_server.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidRootServer(self.root_server.clone()));
        }

        if self.upstream_port == 0 {
            return Err(ConfigError::ParseError(
                "Upstream port must be greater than 0".to_string(),
            ));
        }

        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        // Timeout must be reasonable
        if self.upstream_timeout.as_secs() > 300 {
            return Err(ConfigError::InvalidTimeout(
                "Timeout too large (max 300 seconds)".to_string(),
            ));
        }

        if self.max_iterations == Some(0) {
            return Err(ConfigError::ParseError(
                "Max iterations must be greater than 0".to_string(),
            ));
        }

        if self.max_depth == Some(0) {
            return Err(ConfigError::ParseError(
                "Max depth must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a boolean from a string, with a default value for invalid input
pub fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

/// An empty value or "unbounded" clears the limit.
fn parse_limit(s: &str, what: &str) -> Result<Option<usize>, ConfigError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    s.parse::<usize>()
        .map(Some)
        .map_err(|_| ConfigError::ParseError(format!("Invalid {}: {}", what, s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DnsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr, "0.0.0.0:8053".parse().unwrap());
        assert_eq!(config.root_server, "198.41.0.4");
        assert_eq!(config.max_iterations, None);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = DnsConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config, DnsConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = DnsConfig::from_lookup(env(&[
            ("WALKDNS_UDP_ENABLED", "off"),
            ("WALKDNS_UDP_IP", "127.0.0.1"),
            ("WALKDNS_UDP_PORT", "5353"),
            ("WALKDNS_ROOT_SERVER", "a.root-servers.net"),
            ("WALKDNS_UPSTREAM_PORT", "5300"),
            ("WALKDNS_UPSTREAM_TIMEOUT", "2"),
            ("WALKDNS_MAX_ITERATIONS", "16"),
            ("WALKDNS_MAX_DEPTH", "unbounded"),
        ]))
        .unwrap();

        assert!(!config.udp_enabled);
        assert_eq!(config.bind_addr, "127.0.0.1:5353".parse().unwrap());
        assert_eq!(config.root_server, "a.root-servers.net");
        assert_eq!(config.upstream_port, 5300);
        assert_eq!(config.upstream_timeout, Duration::from_secs(2));
        assert_eq!(config.max_iterations, Some(16));
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_invalid_bind_ip() {
        let result = DnsConfig::from_lookup(env(&[("WALKDNS_UDP_IP", "not-an-ip")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidBindAddress("not-an-ip".to_string()))
        );
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(DnsConfig::from_lookup(env(&[("WALKDNS_UPSTREAM_TIMEOUT", "0")])).is_err());
        assert!(DnsConfig::from_lookup(env(&[("WALKDNS_UPSTREAM_TIMEOUT", "soon")])).is_err());

        let config = DnsConfig {
            upstream_timeout: Duration::from_secs(400),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_root_server() {
        let config = DnsConfig {
            root_server: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRootServer(_))
        ));
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(DnsConfig::from_lookup(env(&[("WALKDNS_MAX_ITERATIONS", "0")])).is_err());
        assert!(DnsConfig::from_lookup(env(&[("WALKDNS_MAX_DEPTH", "x")])).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true", false));
        assert!(parse_bool("TRUE", false));
        assert!(parse_bool("1", false));
        assert!(parse_bool("yes", false));
        assert!(parse_bool("on", false));

        assert!(!parse_bool("false", true));
        assert!(!parse_bool("FALSE", true));
        assert!(!parse_bool("0", true));
        assert!(!parse_bool("no", true));
        assert!(!parse_bool("off", true));

        assert!(parse_bool("invalid", true));
        assert!(!parse_bool("invalid", false));
    }
}
