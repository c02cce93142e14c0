use ferrous_stub_application::ports::{Scheduler, TimerHandle, TimerTag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// [`Scheduler`] backed by tokio timers.
///
/// Each timer is a spawned sleep that posts its tag into `fired` unless it is
/// cancelled first. The owner of the receiving end delivers the tags back to
/// its client. Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    fired: mpsc::UnboundedSender<TimerTag>,
}

impl TokioScheduler {
    pub fn new(fired: mpsc::UnboundedSender<TimerTag>) -> Self {
        Self { fired }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerTag>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[derive(Debug)]
pub struct TokioTimer {
    cancel: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl TimerHandle for TokioTimer {
    fn cancel(&mut self) {
        self.cancel.cancel();
    }

    fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.fired.load(Ordering::Acquire)
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TokioTimer;

    fn now(&self) -> Instant {
        // Follows the tokio clock so paused test time applies.
        tokio::time::Instant::now().into_std()
    }

    fn call_later(&self, delay: Duration, tag: TimerTag) -> TokioTimer {
        let cancel = CancellationToken::new();
        let fired = Arc::new(AtomicBool::new(false));

        let token = cancel.clone();
        let flag = Arc::clone(&fired);
        let events = self.fired.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(?tag, "Timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    flag.store(true, Ordering::Release);
                    let _ = events.send(tag);
                }
            }
        });

        TokioTimer { cancel, fired }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_stub_domain::TransactionId;

    fn tag(id: u16) -> TimerTag {
        TimerTag::Pending {
            id: TransactionId::new(id),
            serial: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (scheduler, mut fired) = TokioScheduler::channel();
        let timer = scheduler.call_later(Duration::from_secs(5), tag(1));

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert!(fired.try_recv().is_err());
        assert!(timer.is_active());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.recv().await, Some(tag(1)));
        assert!(!timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (scheduler, mut fired) = TokioScheduler::channel();
        let mut timer = scheduler.call_later(Duration::from_secs(1), tag(2));

        timer.cancel();
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!timer.is_active());
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_now_follows_paused_clock() {
        let (scheduler, _fired) = TokioScheduler::channel();
        let before = scheduler.now();

        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(scheduler.now() - before, Duration::from_secs(30));
    }
}
