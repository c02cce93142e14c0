use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

pub const DEFAULT_DNS_PORT: u16 = 53;

/// Wire transport used to reach the upstream server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    /// One message per datagram, no framing (RFC 1035 §4.2.1).
    #[default]
    Udp,
    /// Length-prefixed messages over a byte stream (RFC 1035 §4.2.2).
    Tcp,
}

impl TransportProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Tcp)
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            other => Err(format!("Unknown transport '{}'. Expected 'udp' or 'tcp'", other)),
        }
    }
}

/// Where a client connects to, and optionally where it binds locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpstreamEndpoint {
    pub protocol: TransportProtocol,
    pub server: SocketAddr,
    pub source: Option<SocketAddr>,
}

impl UpstreamEndpoint {
    pub fn new(protocol: TransportProtocol, server: SocketAddr) -> Self {
        Self {
            protocol,
            server,
            source: None,
        }
    }

    pub fn udp(server: SocketAddr) -> Self {
        Self::new(TransportProtocol::Udp, server)
    }

    pub fn tcp(server: SocketAddr) -> Self {
        Self::new(TransportProtocol::Tcp, server)
    }

    pub fn with_source(mut self, source: SocketAddr) -> Self {
        self.source = Some(source);
        self
    }

    /// Local address to bind before talking to the server.
    ///
    /// Falls back to the wildcard address of the server's family on an
    /// ephemeral port.
    pub fn bind_addr(&self) -> SocketAddr {
        self.source.unwrap_or_else(|| {
            let wildcard = if self.server.is_ipv4() {
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            } else {
                IpAddr::V6(Ipv6Addr::UNSPECIFIED)
            };
            SocketAddr::new(wildcard, 0)
        })
    }
}

impl fmt::Display for UpstreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            TransportProtocol::Udp => write!(f, "udp://{}", self.server),
            TransportProtocol::Tcp => write!(f, "tcp://{}", self.server),
        }
    }
}

fn parse_server_addr(addr_str: &str) -> Result<SocketAddr, String> {
    if let Ok(addr) = addr_str.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = addr_str.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT));
    }
    Err(format!("Invalid address '{}'", addr_str))
}

impl FromStr for UpstreamEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(addr_str) = s.strip_prefix("udp://") {
            let addr = parse_server_addr(addr_str)
                .map_err(|_| format!("Invalid UDP address '{}'", addr_str))?;
            return Ok(Self::udp(addr));
        }
        if let Some(addr_str) = s.strip_prefix("tcp://") {
            let addr = parse_server_addr(addr_str)
                .map_err(|_| format!("Invalid TCP address '{}'", addr_str))?;
            return Ok(Self::tcp(addr));
        }
        if let Ok(addr) = parse_server_addr(s) {
            return Ok(Self::udp(addr));
        }
        Err(format!(
            "Invalid DNS endpoint format: '{}'. Expected: udp://IP:PORT, tcp://IP:PORT, IP:PORT or IP",
            s
        ))
    }
}
