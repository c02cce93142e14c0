use super::outcome::{Outcome, QueryResult};
use crate::ports::TimerHandle;
use ferrous_stub_domain::TransactionId;

/// A query that has been transmitted and is waiting for its response.
#[derive(Debug)]
pub struct PendingRequest<Q, R, H> {
    id: TransactionId,
    query: Q,
    outcome: Outcome<R>,
    timer: Option<H>,
    serial: u64,
}

impl<Q, R, H: TimerHandle> PendingRequest<Q, R, H> {
    pub(crate) fn new(
        id: TransactionId,
        query: Q,
        outcome: Outcome<R>,
        timer: Option<H>,
        serial: u64,
    ) -> Self {
        Self {
            id,
            query,
            outcome,
            timer,
            serial,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn has_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(TimerHandle::is_active)
    }

    pub(crate) fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            if timer.is_active() {
                timer.cancel();
            }
        }
    }

    /// Cancels the timer, then resolves. Consumes the request so it cannot
    /// be resolved twice.
    pub(crate) fn resolve(mut self, result: QueryResult<R>) -> bool {
        self.cancel_timer();
        self.outcome.resolve(result)
    }
}
