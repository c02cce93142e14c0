use super::{issue, Table};
use crate::correlation::{Outcome, ResponseHandle};
use crate::ports::{DnsCodec, DnsTransport, Scheduler, TimerTag};
use bytes::Bytes;
use ferrous_stub_domain::{IdCollisionPolicy, QueryError, TransactionId};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Query client for datagram transports: one message per datagram, no framing.
pub struct DatagramClient<C: DnsCodec, T, S: Scheduler> {
    codec: C,
    transport: Option<T>,
    scheduler: S,
    table: Table<C, S>,
}

impl<C, T, S> DatagramClient<C, T, S>
where
    C: DnsCodec,
    T: DnsTransport,
    S: Scheduler,
{
    pub fn new(codec: C, transport: T, scheduler: S, collision_policy: IdCollisionPolicy) -> Self {
        Self {
            codec,
            transport: Some(transport),
            scheduler,
            table: Table::<C, S>::new(collision_policy),
        }
    }

    /// Sends `query` and returns a handle that resolves with its response.
    ///
    /// `None` waits forever; `Some(ZERO)` fails with `Timeout` without sending.
    pub fn send(&mut self, query: C::Query, timeout: Option<Duration>) -> ResponseHandle<C::Response> {
        let (outcome, handle) = Outcome::channel();
        self.send_with(query, outcome, timeout);
        handle
    }

    /// Like [`send`](Self::send), resolving an outcome the caller already holds.
    pub fn send_with(
        &mut self,
        query: C::Query,
        mut outcome: Outcome<C::Response>,
        timeout: Option<Duration>,
    ) {
        let Some(transport) = self.transport.as_mut() else {
            outcome.fail(QueryError::ConnectionLost("client closed".to_string()));
            return;
        };

        issue(
            &self.codec,
            &self.scheduler,
            &mut self.table,
            transport,
            query,
            outcome,
            timeout,
            |wire| Ok(Bytes::from(wire)),
        );
    }

    pub fn datagram_received(&mut self, datagram: &[u8]) {
        let Some(id) = TransactionId::from_wire(datagram) else {
            warn!(bytes = datagram.len(), "Dropping datagram too short to carry a transaction id");
            return;
        };
        self.table.complete(&self.codec, id, datagram);
    }

    pub fn on_timer(&mut self, tag: TimerTag) {
        match tag {
            TimerTag::Pending { id, serial } => {
                self.table.on_timer(id, serial);
            }
            TimerTag::Queued { id, .. } => {
                debug!(transaction_id = %id, "Datagram client has no connect queue, ignoring timer");
            }
        }
    }

    pub fn cancel(&mut self, id: TransactionId) -> bool {
        self.table.cancel(id)
    }

    /// The socket failed; every pending query fails with `ConnectionLost`.
    pub fn connection_lost(&mut self, reason: &str) {
        self.transport = None;
        let failed = self
            .table
            .fail_all(QueryError::ConnectionLost(reason.to_string()));
        warn!(reason, failed, "Datagram transport lost");
    }

    /// Closes the transport and fails every pending query. Later sends fail
    /// with `ConnectionLost`.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        let failed = self
            .table
            .fail_all(QueryError::ConnectionLost("client closed".to_string()));
        info!(failed, "Datagram client closed");
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_pending(&self, id: TransactionId) -> bool {
        self.table.contains(id)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}
