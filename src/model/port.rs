//! Port mapping normalization

use serde::{Deserialize, Serialize};

/// Network protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Port mapping between host and container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub host_port: u32,
    pub container_port: u32,
    /// Protocol suffix, when given (`8080:80/udp`)
    pub protocol: Option<Protocol>,
}

impl PortMapping {
    /// Normalize a raw port specification
    ///
    /// Accepts `N`, `HOST:CONTAINER`, and `IP:HOST:CONTAINER`, each with an
    /// optional `/tcp` or `/udp` suffix. A bare number maps the same port
    /// on both sides. Malformed numbers fall back to 0 and negative input
    /// is tolerated by taking the absolute value.
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim();
        let (spec, protocol) = match raw.rsplit_once('/') {
            Some((spec, "udp")) => (spec, Some(Protocol::Udp)),
            Some((spec, "tcp")) => (spec, Some(Protocol::Tcp)),
            _ => (raw, None),
        };

        let parts: Vec<&str> = spec.split(':').collect();
        let (host, container) = match parts.as_slice() {
            [single] => (parse_port(single), parse_port(single)),
            [host, container] => (parse_port(host), parse_port(container)),
            // ip:host:container - the bind address is not part of the
            // canonical model
            [_ip, host, container] => (parse_port(host), parse_port(container)),
            _ => (0, 0),
        };

        Self {
            host_port: host,
            container_port: container,
            protocol,
        }
    }
}

fn parse_port(s: &str) -> u32 {
    s.trim().parse::<i64>().map_or(0, |n| n.unsigned_abs() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pair() {
        let port = PortMapping::normalize("8080:80");
        assert_eq!(port.host_port, 8080);
        assert_eq!(port.container_port, 80);
        assert_eq!(port.protocol, None);
    }

    #[test]
    fn test_normalize_bare_number() {
        let port = PortMapping::normalize("5432");
        assert_eq!(port.host_port, 5432);
        assert_eq!(port.container_port, 5432);
    }

    #[test]
    fn test_normalize_with_address() {
        let port = PortMapping::normalize("127.0.0.1:8443:443");
        assert_eq!(port.host_port, 8443);
        assert_eq!(port.container_port, 443);
    }

    #[test]
    fn test_normalize_protocol_suffix() {
        let port = PortMapping::normalize("53:53/udp");
        assert_eq!(port.protocol, Some(Protocol::Udp));
        assert_eq!(port.container_port, 53);
    }

    #[test]
    fn test_normalize_negative_is_tolerated() {
        let port = PortMapping::normalize("-8080:80");
        assert_eq!(port.host_port, 8080);
        assert_eq!(port.container_port, 80);
    }
}
