use crate::correlation::Outcome;
use crate::ports::{Scheduler, TimerHandle, TimerTag};
use ferrous_stub_domain::{IdCollisionPolicy, QueryError, TransactionId};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug)]
struct QueuedRequest<Q, R, H> {
    id: TransactionId,
    query: Q,
    outcome: Outcome<R>,
    deadline: Option<Instant>,
    timer: Option<H>,
    serial: u64,
}

impl<Q, R, H: TimerHandle> QueuedRequest<Q, R, H> {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            if timer.is_active() {
                timer.cancel();
            }
        }
    }

    fn fail(mut self, error: QueryError) -> bool {
        self.cancel_timer();
        self.outcome.fail(error)
    }
}

/// A queued query released once the connection is up, with whatever is left
/// of its timeout.
#[derive(Debug)]
pub struct FlushedRequest<Q, R> {
    pub id: TransactionId,
    pub query: Q,
    pub outcome: Outcome<R>,
    /// `None` for a query without a timeout; `Some(ZERO)` once the deadline passed.
    pub remaining: Option<Duration>,
}

/// Queries submitted while a stream connection is still being established.
///
/// Entries keep their submission order and run their timeout from the moment
/// they were queued, not from when they are finally sent.
#[derive(Debug)]
pub struct ConnectQueue<Q, R, H> {
    entries: VecDeque<QueuedRequest<Q, R, H>>,
    collision_policy: IdCollisionPolicy,
    next_serial: u64,
}

impl<Q, R, H: TimerHandle> Default for ConnectQueue<Q, R, H> {
    fn default() -> Self {
        Self::new(IdCollisionPolicy::default())
    }
}

impl<Q, R, H: TimerHandle> ConnectQueue<Q, R, H> {
    pub fn new(collision_policy: IdCollisionPolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            collision_policy,
            next_serial: 0,
        }
    }

    /// Returns `false` when the query failed instead of being queued: an
    /// exhausted timeout, or a rejected duplicate id.
    pub fn enqueue<S>(
        &mut self,
        scheduler: &S,
        id: TransactionId,
        query: Q,
        mut outcome: Outcome<R>,
        timeout: Option<Duration>,
    ) -> bool
    where
        S: Scheduler<Handle = H>,
    {
        if timeout.is_some_and(|t| t.is_zero()) {
            debug!(transaction_id = %id, "Queued query timeout already elapsed");
            outcome.fail(QueryError::Timeout);
            return false;
        }

        if let Some(position) = self.position(id) {
            match self.collision_policy {
                IdCollisionPolicy::Reject => {
                    warn!(transaction_id = %id, "Rejecting queued query, transaction id already waiting");
                    outcome.fail(QueryError::DuplicateId(id));
                    return false;
                }
                IdCollisionPolicy::Replace => {
                    warn!(transaction_id = %id, "Replacing queued query with the same transaction id");
                    if let Some(displaced) = self.entries.remove(position) {
                        displaced.fail(QueryError::DuplicateId(id));
                    }
                }
            }
        }

        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);

        let now = scheduler.now();
        let deadline = timeout.and_then(|t| now.checked_add(t));
        let timer = timeout.map(|delay| scheduler.call_later(delay, TimerTag::Queued { id, serial }));

        debug!(transaction_id = %id, queued = self.entries.len() + 1, "Query waiting for connection");
        self.entries.push_back(QueuedRequest {
            id,
            query,
            outcome,
            deadline,
            timer,
            serial,
        });
        true
    }

    /// Handles a fired queue timer. Stale fires are ignored.
    pub fn on_timer(&mut self, id: TransactionId, serial: u64) -> bool {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.id == id && entry.serial == serial);

        match position.and_then(|p| self.entries.remove(p)) {
            Some(entry) => {
                debug!(transaction_id = %id, "Queued query timed out before connection was established");
                entry.fail(QueryError::Timeout)
            }
            None => false,
        }
    }

    pub fn cancel(&mut self, id: TransactionId) -> bool {
        match self.position(id).and_then(|p| self.entries.remove(p)) {
            Some(entry) => entry.fail(QueryError::Cancelled),
            None => false,
        }
    }

    /// Empties the queue in submission order, cancelling queue timers and
    /// computing each query's remaining timeout against `now`.
    pub fn drain(&mut self, now: Instant) -> impl Iterator<Item = FlushedRequest<Q, R>> + '_ {
        self.entries
            .drain(..)
            .map(move |mut entry| {
                entry.cancel_timer();
                let remaining = entry
                    .deadline
                    .map(|deadline| deadline.saturating_duration_since(now));
                FlushedRequest {
                    id: entry.id,
                    query: entry.query,
                    outcome: entry.outcome,
                    remaining,
                }
            })
    }

    pub fn fail_all(&mut self, reason: QueryError) -> usize {
        let failed = self.entries.len();
        for entry in self.entries.drain(..) {
            entry.fail(reason.clone());
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: TransactionId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }
}
