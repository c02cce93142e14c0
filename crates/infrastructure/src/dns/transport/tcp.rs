//! DNS over TCP (RFC 1035 §4.2.2)
//!
//! Every message carries a two-byte big-endian length prefix. One connection
//! carries all queries of the client; responses may come back in any order.

use super::socket::bind_tcp;
use super::Command;
use crate::dns::{HickoryCodec, TokioScheduler};
use bytes::Bytes;
use ferrous_stub_application::ports::{DnsTransport, StreamConnector, TimerTag};
use ferrous_stub_application::{Outcome, ResponseHandle, StreamClient};
use ferrous_stub_domain::{IdCollisionPolicy, QueryError, TransactionId, UpstreamEndpoint};
use hickory_proto::op::Message;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const READ_BUFFER_SIZE: usize = 16 * 1024;

type Client = StreamClient<HickoryCodec, TcpWriter, TokioScheduler>;

/// Queues framed messages for the writer task.
struct TcpWriter {
    frames: Option<mpsc::UnboundedSender<Bytes>>,
}

impl TcpWriter {
    fn spawn(mut half: OwnedWriteHalf) -> Self {
        let (frames, mut rx) = mpsc::unbounded_channel::<Bytes>();
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = half.write_all(&frame).await {
                    warn!(error = %e, "Failed to write TCP query");
                    return;
                }
            }
            let _ = half.shutdown().await;
        });
        Self {
            frames: Some(frames),
        }
    }
}

impl DnsTransport for TcpWriter {
    fn write(&mut self, wire: Bytes) -> Result<(), QueryError> {
        let frames = self
            .frames
            .as_ref()
            .ok_or_else(|| QueryError::Transport("connection closed".to_string()))?;
        frames
            .send(wire)
            .map_err(|_| QueryError::Transport("TCP writer stopped".to_string()))
    }

    fn close(&mut self) {
        self.frames = None;
    }
}

/// Opens the connection in a background task and reports the result to the driver.
struct TokioConnector {
    results: mpsc::UnboundedSender<io::Result<TcpStream>>,
}

impl StreamConnector for TokioConnector {
    fn connect(&mut self, endpoint: &UpstreamEndpoint) {
        let endpoint = *endpoint;
        let results = self.results.clone();
        tokio::spawn(async move {
            let result = async {
                let socket = bind_tcp(&endpoint)?;
                let stream = socket.connect(endpoint.server).await?;
                stream.set_nodelay(true)?;
                Ok::<_, io::Error>(stream)
            }
            .await;
            let _ = results.send(result);
        });
    }
}

/// TCP query client.
///
/// Returned before the connection is up; queries sent in the meantime are
/// queued and go out in order once it is. If the connection cannot be made
/// every queued query fails with `ConnectionLost`.
pub struct TcpDnsClient {
    commands: mpsc::UnboundedSender<Command>,
    endpoint: UpstreamEndpoint,
}

impl TcpDnsClient {
    /// Must be called from within a tokio runtime.
    pub fn connect(endpoint: &UpstreamEndpoint, collision_policy: IdCollisionPolicy) -> Self {
        let (scheduler, timers) = TokioScheduler::channel();
        let client = StreamClient::new(HickoryCodec::new(), scheduler, collision_policy);

        let (results, connect_rx) = mpsc::unbounded_channel();
        let connector = TokioConnector { results };

        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(
            client,
            connector,
            *endpoint,
            command_rx,
            timers,
            connect_rx,
        ));

        Self {
            commands,
            endpoint: *endpoint,
        }
    }

    pub fn query(&self, query: Message, timeout: Option<Duration>) -> ResponseHandle<Message> {
        let (outcome, handle) = Outcome::channel();
        super::submit(&self.commands, query, outcome, timeout);
        handle
    }

    pub fn cancel(&self, id: TransactionId) {
        let _ = self.commands.send(Command::Cancel(id));
    }

    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    pub fn endpoint(&self) -> &UpstreamEndpoint {
        &self.endpoint
    }

    pub fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

async fn read_chunk(reader: &mut Option<OwnedReadHalf>, buf: &mut [u8]) -> io::Result<usize> {
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

async fn drive(
    mut client: Client,
    mut connector: TokioConnector,
    endpoint: UpstreamEndpoint,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut timers: mpsc::UnboundedReceiver<TimerTag>,
    mut connects: mpsc::UnboundedReceiver<io::Result<TcpStream>>,
) {
    client.connect(&mut connector, &endpoint);

    let mut reader: Option<OwnedReadHalf> = None;
    let mut read_buf = vec![0u8; READ_BUFFER_SIZE];

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
            Some(connected) = connects.recv() => match connected {
                Ok(stream) => {
                    info!(upstream = %endpoint, "TCP connection established");
                    let (read_half, write_half) = stream.into_split();
                    reader = Some(read_half);
                    client.connection_made(TcpWriter::spawn(write_half));
                }
                Err(e) => {
                    warn!(upstream = %endpoint, error = %e, "TCP connect failed");
                    client.connection_lost(&e.to_string());
                    break;
                }
            },
            read = read_chunk(&mut reader, &mut read_buf) => match read {
                Ok(0) => {
                    client.connection_lost("connection closed by peer");
                    break;
                }
                Ok(len) => {
                    debug!(bytes = len, "TCP data received");
                    client.data_received(&read_buf[..len]);
                }
                Err(e) => {
                    error!(upstream = %endpoint, error = %e, "TCP read failed");
                    client.connection_lost(&e.to_string());
                    break;
                }
            },
        }
    }
    debug!(upstream = %endpoint, "TCP driver stopped");
}
