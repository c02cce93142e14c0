mod socket;
pub mod tcp;
pub mod udp;

use ferrous_stub_application::{Outcome, ResponseHandle};
use ferrous_stub_domain::{
    QueryConfig, QueryError, TransactionId, TransportProtocol, UpstreamEndpoint,
};
use hickory_proto::op::Message;
use std::time::Duration;
use tokio::sync::mpsc;

pub use tcp::TcpDnsClient;
pub use udp::{UdpDnsClient, DEFAULT_MAX_UDP_PAYLOAD};

/// Requests from a client handle to its driver task.
pub(crate) enum Command {
    Send {
        query: Message,
        outcome: Outcome<Message>,
        timeout: Option<Duration>,
    },
    Cancel(TransactionId),
    Close,
}

/// Hands a query to the driver, failing it straight away if the driver is gone.
/// A zero timeout resolves with `Timeout` before returning and sends nothing.
pub(crate) fn submit(
    commands: &mpsc::UnboundedSender<Command>,
    query: Message,
    mut outcome: Outcome<Message>,
    timeout: Option<Duration>,
) {
    if timeout == Some(Duration::ZERO) {
        outcome.fail(QueryError::Timeout);
        return;
    }
    let command = Command::Send {
        query,
        outcome,
        timeout,
    };
    if let Err(mpsc::error::SendError(Command::Send { mut outcome, .. })) = commands.send(command)
    {
        outcome.fail(QueryError::ConnectionLost("client closed".to_string()));
    }
}

pub enum DnsClient {
    Udp(UdpDnsClient),
    Tcp(TcpDnsClient),
}

impl DnsClient {
    pub fn query(&self, query: Message, timeout: Option<Duration>) -> ResponseHandle<Message> {
        match self {
            Self::Udp(c) => c.query(query, timeout),
            Self::Tcp(c) => c.query(query, timeout),
        }
    }

    pub fn cancel(&self, id: TransactionId) {
        match self {
            Self::Udp(c) => c.cancel(id),
            Self::Tcp(c) => c.cancel(id),
        }
    }

    pub fn close(&self) {
        match self {
            Self::Udp(c) => c.close(),
            Self::Tcp(c) => c.close(),
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
        }
    }
}

/// Builds the client for `endpoint`. UDP clients are ready on return; TCP
/// clients connect in the background and queue queries until then.
pub async fn create_client(
    endpoint: &UpstreamEndpoint,
    config: &QueryConfig,
) -> Result<DnsClient, QueryError> {
    match endpoint.protocol {
        TransportProtocol::Udp => Ok(DnsClient::Udp(
            UdpDnsClient::connect(endpoint, config.id_collision, config.max_udp_payload).await?,
        )),
        TransportProtocol::Tcp => Ok(DnsClient::Tcp(TcpDnsClient::connect(
            endpoint,
            config.id_collision,
        ))),
    }
}
