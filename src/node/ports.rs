//! Port mapping parsing
//!
//! Accepts the Docker publish syntax `[hostIP:][hostPort:]containerPort[/protocol]`.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A parsed `--publish` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: Option<IpAddr>,
    pub host_port: Option<u16>,
    pub container_port: u16,
    pub protocol: String,
}

fn parse_port(value: &str, what: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("invalid {} '{}'", what, value)),
        Ok(port) => Ok(port),
    }
}

impl FromStr for PortMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (spec, protocol) = match s.split_once('/') {
            Some((spec, proto)) => (spec, proto),
            None => (s, "tcp"),
        };
        if !matches!(protocol, "tcp" | "udp" | "sctp") {
            return Err(format!("unsupported protocol '{}'", protocol));
        }

        // IPv6 host IPs contain ':' themselves, so split from the right
        let mut parts = spec.rsplitn(3, ':');
        let container = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "missing container port".to_string())?;
        let host_port = parts.next();
        let host_ip = parts.next();

        let container_port = parse_port(container, "container port")?;
        let host_port = match host_port {
            Some("") | None => None,
            Some(p) => Some(parse_port(p, "host port")?),
        };
        let host_ip = match host_ip {
            None | Some("") => None,
            Some(ip) => {
                let trimmed = ip.trim_start_matches('[').trim_end_matches(']');
                Some(
                    trimmed
                        .parse::<IpAddr>()
                        .map_err(|_| format!("invalid host IP '{}'", ip))?,
                )
            }
        };

        Ok(Self {
            host_ip,
            host_port,
            container_port,
            protocol: protocol.to_string(),
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.host_ip, self.host_port) {
            (Some(ip), Some(port)) => write!(f, "{}:{}:", ip, port)?,
            (Some(ip), None) => write!(f, "{}::", ip)?,
            (None, Some(port)) => write!(f, "{}:", port)?,
            (None, None) => {}
        }
        write!(f, "{}/{}", self.container_port, self.protocol)
    }
}
