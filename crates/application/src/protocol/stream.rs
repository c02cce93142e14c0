use super::connect_queue::ConnectQueue;
use super::{issue, Table};
use crate::correlation::{Outcome, ResponseHandle};
use crate::framing::{encode_frame, FrameExtractor};
use crate::ports::{DnsCodec, DnsTransport, Scheduler, StreamConnector, TimerTag};
use ferrous_stub_domain::{IdCollisionPolicy, QueryError, TransactionId, UpstreamEndpoint};
use std::time::Duration;
use tracing::{debug, info, warn};

enum Connection<T> {
    Connecting,
    Connected(T),
    Closed,
}

type Queue<C, S> = ConnectQueue<
    <C as DnsCodec>::Query,
    <C as DnsCodec>::Response,
    <S as Scheduler>::Handle,
>;

/// Query client for stream transports.
///
/// Queries sent before the connection is up wait in a [`ConnectQueue`] and are
/// flushed in order by [`connection_made`](Self::connection_made). Responses
/// may arrive in any order and in arbitrarily split chunks.
pub struct StreamClient<C: DnsCodec, T, S: Scheduler> {
    codec: C,
    scheduler: S,
    connection: Connection<T>,
    queue: Queue<C, S>,
    table: Table<C, S>,
    extractor: FrameExtractor,
}

impl<C, T, S> StreamClient<C, T, S>
where
    C: DnsCodec,
    T: DnsTransport,
    S: Scheduler,
{
    pub fn new(codec: C, scheduler: S, collision_policy: IdCollisionPolicy) -> Self {
        Self {
            codec,
            scheduler,
            connection: Connection::Connecting,
            queue: Queue::<C, S>::new(collision_policy),
            table: Table::<C, S>::new(collision_policy),
            extractor: FrameExtractor::new(),
        }
    }

    /// Asks `connector` to open the connection. Its completion comes back as
    /// [`connection_made`](Self::connection_made) or
    /// [`connection_lost`](Self::connection_lost).
    pub fn connect<K: StreamConnector>(&mut self, connector: &mut K, endpoint: &UpstreamEndpoint) {
        info!(upstream = %endpoint, "Connecting to upstream");
        connector.connect(endpoint);
    }

    pub fn send(&mut self, query: C::Query, timeout: Option<Duration>) -> ResponseHandle<C::Response> {
        let (outcome, handle) = Outcome::channel();
        self.send_with(query, outcome, timeout);
        handle
    }

    pub fn send_with(
        &mut self,
        query: C::Query,
        mut outcome: Outcome<C::Response>,
        timeout: Option<Duration>,
    ) {
        match &mut self.connection {
            Connection::Connecting => {
                let id = self.codec.transaction_id(&query);
                self.queue.enqueue(&self.scheduler, id, query, outcome, timeout);
            }
            Connection::Connected(transport) => issue(
                &self.codec,
                &self.scheduler,
                &mut self.table,
                transport,
                query,
                outcome,
                timeout,
                |wire| encode_frame(&wire),
            ),
            Connection::Closed => {
                outcome.fail(QueryError::ConnectionLost("connection closed".to_string()));
            }
        }
    }

    /// The connection is up: flush the connect queue in submission order,
    /// each query keeping what is left of its timeout.
    pub fn connection_made(&mut self, mut transport: T) {
        match self.connection {
            Connection::Connecting => {}
            Connection::Connected(_) => {
                warn!("Ignoring second connection for an already connected client");
                transport.close();
                return;
            }
            Connection::Closed => {
                debug!("Connection completed after close, dropping it");
                transport.close();
                return;
            }
        }

        let now = self.scheduler.now();
        let flushed: Vec<_> = self.queue.drain(now).collect();
        info!(flushed = flushed.len(), "Connection established");

        self.connection = Connection::Connected(transport);
        if let Connection::Connected(transport) = &mut self.connection {
            for request in flushed {
                issue(
                    &self.codec,
                    &self.scheduler,
                    &mut self.table,
                    transport,
                    request.query,
                    request.outcome,
                    request.remaining,
                    |wire| encode_frame(&wire),
                );
            }
        }
    }

    pub fn data_received(&mut self, chunk: &[u8]) {
        for frame in self.extractor.feed(chunk) {
            let Some(id) = TransactionId::from_wire(&frame) else {
                warn!(bytes = frame.len(), "Dropping frame too short to carry a transaction id");
                continue;
            };
            self.table.complete(&self.codec, id, &frame);
        }
    }

    /// The connection failed or was closed by the peer. Every pending and
    /// queued query fails with `ConnectionLost`; their timers are cancelled.
    pub fn connection_lost(&mut self, reason: &str) {
        self.connection = Connection::Closed;
        self.extractor.reset();

        let error = QueryError::ConnectionLost(reason.to_string());
        let pending = self.table.fail_all(error.clone());
        let queued = self.queue.fail_all(error);
        warn!(reason, pending, queued, "Upstream connection lost");
    }

    pub fn close(&mut self) {
        if let Connection::Connected(mut transport) =
            std::mem::replace(&mut self.connection, Connection::Closed)
        {
            transport.close();
        }
        self.extractor.reset();

        let error = QueryError::ConnectionLost("client closed".to_string());
        let pending = self.table.fail_all(error.clone());
        let queued = self.queue.fail_all(error);
        info!(pending, queued, "Stream client closed");
    }

    pub fn on_timer(&mut self, tag: TimerTag) {
        match tag {
            TimerTag::Pending { id, serial } => {
                self.table.on_timer(id, serial);
            }
            TimerTag::Queued { id, serial } => {
                self.queue.on_timer(id, serial);
            }
        }
    }

    pub fn cancel(&mut self, id: TransactionId) -> bool {
        self.table.cancel(id) || self.queue.cancel(id)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.connection, Connection::Closed)
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, id: TransactionId) -> bool {
        self.table.contains(id)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
