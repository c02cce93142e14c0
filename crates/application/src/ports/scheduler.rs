use ferrous_stub_domain::TransactionId;
use std::time::{Duration, Instant};

/// Identifies which entry a timer belongs to when it fires.
///
/// The serial distinguishes successive requests that reuse the same
/// transaction id, so a stale fire never expires a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTag {
    /// Timer of a request registered in the correlation table.
    Pending { id: TransactionId, serial: u64 },
    /// Timer of a request waiting in the connect queue.
    Queued { id: TransactionId, serial: u64 },
}

impl TimerTag {
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::Pending { id, .. } | Self::Queued { id, .. } => *id,
        }
    }
}

pub trait TimerHandle {
    /// Cancelling a timer that already fired or was already cancelled is a no-op.
    fn cancel(&mut self);

    fn is_active(&self) -> bool;
}

/// Clock plus one-shot timers.
///
/// A fired timer is delivered back to the owning client as its [`TimerTag`]
/// through whatever event loop drives it.
pub trait Scheduler {
    type Handle: TimerHandle;

    fn now(&self) -> Instant;

    fn call_later(&self, delay: Duration, tag: TimerTag) -> Self::Handle;
}
