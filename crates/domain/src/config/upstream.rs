use crate::dns_protocol::{TransportProtocol, UpstreamEndpoint, DEFAULT_DNS_PORT};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Upstream server the client talks to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_address")]
    pub address: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub protocol: TransportProtocol,

    /// Local address to bind; wildcard when unset.
    #[serde(default)]
    pub source_address: Option<IpAddr>,

    #[serde(default)]
    pub source_port: u16,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            protocol: TransportProtocol::default(),
            source_address: None,
            source_port: 0,
        }
    }
}

impl UpstreamConfig {
    pub fn endpoint(&self) -> UpstreamEndpoint {
        let server = SocketAddr::new(self.address, self.port);
        let endpoint = UpstreamEndpoint::new(self.protocol, server);

        if self.source_address.is_none() && self.source_port == 0 {
            return endpoint;
        }

        let source_ip = self.source_address.unwrap_or(match self.address {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        });
        endpoint.with_source(SocketAddr::new(source_ip, self.source_port))
    }
}

fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_DNS_PORT
}
