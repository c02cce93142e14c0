//! DNS over UDP (RFC 1035 §4.2.1)
//!
//! One message per datagram, no framing. A single connected socket carries
//! every query of the client; responses are matched by transaction id.

use super::socket::bind_udp;
use super::Command;
use crate::dns::{HickoryCodec, TokioScheduler};
use bytes::Bytes;
use ferrous_stub_application::ports::{DnsTransport, TimerTag};
use ferrous_stub_application::{DatagramClient, Outcome, ResponseHandle};
use ferrous_stub_domain::{IdCollisionPolicy, QueryError, TransactionId, UpstreamEndpoint};
use hickory_proto::op::Message;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Maximum UDP DNS response size with EDNS(0)
pub const DEFAULT_MAX_UDP_PAYLOAD: usize = 4096;

type Client = DatagramClient<HickoryCodec, UdpWriter, TokioScheduler>;

/// Queues datagrams for the writer task, which awaits socket readiness.
struct UdpWriter {
    datagrams: Option<mpsc::UnboundedSender<Bytes>>,
}

impl UdpWriter {
    fn spawn(socket: Arc<UdpSocket>) -> Self {
        let (datagrams, mut rx) = mpsc::unbounded_channel::<Bytes>();
        tokio::spawn(async move {
            while let Some(wire) = rx.recv().await {
                match socket.send(&wire).await {
                    Ok(sent) if sent == wire.len() => {}
                    Ok(sent) => {
                        warn!(sent, expected = wire.len(), "Short UDP write");
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to send UDP query");
                    }
                }
            }
        });
        Self {
            datagrams: Some(datagrams),
        }
    }
}

impl DnsTransport for UdpWriter {
    fn write(&mut self, wire: Bytes) -> Result<(), QueryError> {
        let datagrams = self
            .datagrams
            .as_ref()
            .ok_or_else(|| QueryError::Transport("socket closed".to_string()))?;
        datagrams
            .send(wire)
            .map_err(|_| QueryError::Transport("UDP writer stopped".to_string()))
    }

    fn close(&mut self) {
        self.datagrams = None;
    }
}

/// UDP query client. Cheap to share by reference; the socket lives in a
/// driver task that stops on [`close`](Self::close) or when the client is dropped.
pub struct UdpDnsClient {
    commands: mpsc::UnboundedSender<Command>,
    endpoint: UpstreamEndpoint,
    local_addr: SocketAddr,
}

impl UdpDnsClient {
    /// Binds and connects the socket, then starts the driver task.
    pub async fn connect(
        endpoint: &UpstreamEndpoint,
        collision_policy: IdCollisionPolicy,
        max_payload: usize,
    ) -> Result<Self, QueryError> {
        let socket = bind_udp(endpoint).map_err(|e| {
            QueryError::Transport(format!("Failed to bind UDP socket: {}", e))
        })?;
        socket.connect(endpoint.server).await.map_err(|e| {
            QueryError::Transport(format!(
                "Failed to connect UDP socket to {}: {}",
                endpoint.server, e
            ))
        })?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| QueryError::Transport(e.to_string()))?;
        let socket = Arc::new(socket);

        let (scheduler, timers) = TokioScheduler::channel();
        let writer = UdpWriter::spawn(Arc::clone(&socket));
        let client = DatagramClient::new(HickoryCodec::new(), writer, scheduler, collision_policy);

        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(client, socket, command_rx, timers, max_payload));

        info!(server = %endpoint.server, local = %local_addr, "UDP client ready");
        Ok(Self {
            commands,
            endpoint: *endpoint,
            local_addr,
        })
    }

    /// Sends `query`. `None` waits forever; a zero timeout fails at once
    /// with `Timeout` and sends nothing.
    pub fn query(&self, query: Message, timeout: Option<Duration>) -> ResponseHandle<Message> {
        let (outcome, handle) = Outcome::channel();
        super::submit(&self.commands, query, outcome, timeout);
        handle
    }

    pub fn cancel(&self, id: TransactionId) {
        let _ = self.commands.send(Command::Cancel(id));
    }

    /// Closes the socket; every pending query fails with `ConnectionLost`.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    pub fn endpoint(&self) -> &UpstreamEndpoint {
        &self.endpoint
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}

async fn drive(
    mut client: Client,
    socket: Arc<UdpSocket>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut timers: mpsc::UnboundedReceiver<TimerTag>,
    max_payload: usize,
) {
    let mut recv_buf = vec![0u8; max_payload];

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send { query, outcome, timeout }) => {
                    client.send_with(query, outcome, timeout);
                }
                Some(Command::Cancel(id)) => {
                    client.cancel(id);
                }
                Some(Command::Close) | None => {
                    client.close();
                    break;
                }
            },
            Some(tag) = timers.recv() => client.on_timer(tag),
            received = socket.recv(&mut recv_buf) => match received {
                Ok(len) => {
                    debug!(bytes = len, "UDP response received");
                    client.datagram_received(&recv_buf[..len]);
                }
                // ICMP port unreachable from an earlier send; queries keep waiting for their timers.
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    warn!(error = %e, "UDP upstream refused a datagram");
                }
                Err(e) => {
                    error!(error = %e, "UDP socket failed");
                    client.connection_lost(&e.to_string());
                    break;
                }
            },
        }
    }
    debug!("UDP driver stopped");
}
