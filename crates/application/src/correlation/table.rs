use super::outcome::{Outcome, QueryResult};
use super::pending::PendingRequest;
use crate::ports::{DnsCodec, Scheduler, TimerHandle, TimerTag};
use ferrous_stub_domain::{IdCollisionPolicy, QueryError, TransactionId};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// What happened to a query handed to [`CorrelationTable::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Waiting for a response; the caller should now transmit it.
    Registered,
    /// The timeout was already exhausted; the outcome failed with `Timeout`.
    Expired,
    /// The id was taken and the policy is `Reject`; the outcome failed with `DuplicateId`.
    Rejected,
}

impl Registration {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }
}

/// In-flight queries of one connection, keyed by transaction id.
///
/// Every entry is removed exactly once: by a response, its timer, a
/// cancellation or a connection-wide failure. Whichever comes first resolves
/// the outcome and the others find nothing.
#[derive(Debug)]
pub struct CorrelationTable<Q, R, H> {
    pending: HashMap<TransactionId, PendingRequest<Q, R, H>>,
    collision_policy: IdCollisionPolicy,
    next_serial: u64,
}

impl<Q, R, H: TimerHandle> Default for CorrelationTable<Q, R, H> {
    fn default() -> Self {
        Self::new(IdCollisionPolicy::default())
    }
}

impl<Q, R, H: TimerHandle> CorrelationTable<Q, R, H> {
    pub fn new(collision_policy: IdCollisionPolicy) -> Self {
        Self {
            pending: HashMap::new(),
            collision_policy,
            next_serial: 0,
        }
    }

    /// Records a query that is about to be transmitted.
    ///
    /// `None` waits forever. A zero timeout fails the outcome with `Timeout`
    /// straight away and nothing is recorded.
    pub fn register<S>(
        &mut self,
        scheduler: &S,
        id: TransactionId,
        query: Q,
        mut outcome: Outcome<R>,
        timeout: Option<Duration>,
    ) -> Registration
    where
        S: Scheduler<Handle = H>,
    {
        if timeout.is_some_and(|t| t.is_zero()) {
            debug!(transaction_id = %id, "Query timeout already elapsed");
            outcome.fail(QueryError::Timeout);
            return Registration::Expired;
        }

        if self.pending.contains_key(&id) {
            match self.collision_policy {
                IdCollisionPolicy::Reject => {
                    warn!(transaction_id = %id, "Rejecting query, transaction id already in flight");
                    outcome.fail(QueryError::DuplicateId(id));
                    return Registration::Rejected;
                }
                IdCollisionPolicy::Replace => {
                    warn!(transaction_id = %id, "Replacing in-flight query with the same transaction id");
                    if let Some(displaced) = self.pending.remove(&id) {
                        displaced.resolve(Err(QueryError::DuplicateId(id)));
                    }
                }
            }
        }

        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        let timer = timeout.map(|delay| scheduler.call_later(delay, TimerTag::Pending { id, serial }));

        self.pending
            .insert(id, PendingRequest::new(id, query, outcome, timer, serial));
        Registration::Registered
    }

    /// Matches a received message to the query waiting on `id`.
    ///
    /// Returns `false` when nothing was waiting; the message is dropped.
    /// Decode failures and mismatching responses fail only this query.
    pub fn complete<C>(&mut self, codec: &C, id: TransactionId, wire: &[u8]) -> bool
    where
        C: DnsCodec<Query = Q, Response = R>,
    {
        let Some(request) = self.pending.remove(&id) else {
            warn!(transaction_id = %id, "No query with this id found to match received response");
            return false;
        };

        let result = match codec.decode(wire, request.query()) {
            Ok(response) if codec.is_response_to(request.query(), &response) => Ok(response),
            Ok(_) => {
                warn!(transaction_id = %id, "Response does not correspond to the query");
                Err(QueryError::BadResponse)
            }
            Err(e) => {
                debug!(transaction_id = %id, error = %e, "Failed to decode response");
                Err(e)
            }
        };

        request.resolve(result);
        true
    }

    /// Fails the query waiting on `id` with `Timeout`.
    pub fn expire(&mut self, id: TransactionId) -> bool {
        debug!(transaction_id = %id, "Query timed out");
        self.abort(id, QueryError::Timeout)
    }

    /// Handles a fired timer. Fires belonging to a request that is gone, or
    /// to an earlier request with the same id, are ignored.
    pub fn on_timer(&mut self, id: TransactionId, serial: u64) -> bool {
        let current = self
            .pending
            .get(&id)
            .is_some_and(|request| request.serial() == serial);

        if !current {
            debug!(transaction_id = %id, serial, "Ignoring stale query timer");
            return false;
        }
        self.expire(id)
    }

    pub fn cancel(&mut self, id: TransactionId) -> bool {
        self.abort(id, QueryError::Cancelled)
    }

    /// Removes the query waiting on `id` and fails it with `error`.
    pub fn abort(&mut self, id: TransactionId, error: QueryError) -> bool {
        match self.pending.remove(&id) {
            Some(request) => request.resolve(Err(error)),
            None => false,
        }
    }

    /// Fails every pending query with `reason` and empties the table.
    /// Returns how many were failed.
    pub fn fail_all(&mut self, reason: QueryError) -> usize {
        let failed = self.pending.len();
        for (_, request) in self.pending.drain() {
            let result: QueryResult<R> = Err(reason.clone());
            request.resolve(result);
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn get(&self, id: TransactionId) -> Option<&PendingRequest<Q, R, H>> {
        self.pending.get(&id)
    }

    pub fn collision_policy(&self) -> IdCollisionPolicy {
        self.collision_policy
    }
}
