//! Deterministic doubles for the unit tests in this crate.

use crate::ports::{DnsCodec, Scheduler, TimerHandle, TimerTag};
use ferrous_stub_domain::{QueryError, TransactionId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Queries and responses are bare transaction ids; the wire form is the id
/// in network order.
pub(crate) struct EchoCodec;

impl DnsCodec for EchoCodec {
    type Query = u16;
    type Response = u16;

    fn transaction_id(&self, query: &u16) -> TransactionId {
        TransactionId::new(*query)
    }

    fn encode(&self, query: &u16) -> Result<Vec<u8>, QueryError> {
        Ok(query.to_be_bytes().to_vec())
    }

    fn decode(&self, wire: &[u8], _query: &u16) -> Result<u16, QueryError> {
        TransactionId::from_wire(wire)
            .map(TransactionId::get)
            .ok_or_else(|| QueryError::Decode("short message".to_string()))
    }

    fn is_response_to(&self, query: &u16, response: &u16) -> bool {
        query == response
    }
}

pub(crate) struct ManualTimer {
    active: Rc<Cell<bool>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(&mut self) {
        self.active.set(false);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

struct ScheduledTimer {
    due: Instant,
    tag: TimerTag,
    active: Rc<Cell<bool>>,
}

/// Virtual clock. Time only moves on [`Clock::advance`].
#[derive(Clone)]
pub(crate) struct Clock {
    now: Rc<Cell<Instant>>,
    timers: Rc<RefCell<Vec<ScheduledTimer>>>,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
            timers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Moves time forward and returns the tags of the timers that fired, in due order.
    pub(crate) fn advance(&self, by: Duration) -> Vec<TimerTag> {
        let now = self.now.get() + by;
        self.now.set(now);

        let mut timers = self.timers.borrow_mut();
        timers.retain(|timer| timer.active.get());
        timers.sort_by_key(|timer| timer.due);

        let mut fired = Vec::new();
        timers.retain(|timer| {
            if timer.due <= now {
                timer.active.set(false);
                fired.push(timer.tag);
                false
            } else {
                true
            }
        });
        fired
    }

    pub(crate) fn active_timers(&self) -> usize {
        self.timers
            .borrow()
            .iter()
            .filter(|timer| timer.active.get())
            .count()
    }
}

impl Scheduler for Clock {
    type Handle = ManualTimer;

    fn now(&self) -> Instant {
        self.now.get()
    }

    fn call_later(&self, delay: Duration, tag: TimerTag) -> ManualTimer {
        let active = Rc::new(Cell::new(true));
        self.timers.borrow_mut().push(ScheduledTimer {
            due: self.now.get() + delay,
            tag,
            active: active.clone(),
        });
        ManualTimer { active }
    }
}
