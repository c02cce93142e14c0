use bytes::Bytes;
use ferrous_stub_application::ports::{
    DnsCodec, DnsTransport, Scheduler, StreamConnector, TimerHandle, TimerTag,
};
use ferrous_stub_domain::{QueryError, TransactionId, UpstreamEndpoint};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

// ── Codec ──────────────────────────────────────────────────────────────────

/// Wire form is `[id_hi, id_lo, question]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestQuery {
    pub id: u16,
    pub question: u8,
}

impl TestQuery {
    pub fn new(id: u16, question: u8) -> Self {
        Self { id, question }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResponse {
    pub id: u16,
    pub question: u8,
    /// Id of the query the message was decoded against.
    pub decoded_for: u16,
}

#[derive(Debug, Default)]
pub struct FakeCodec;

impl FakeCodec {
    pub fn response_bytes(id: u16, question: u8) -> Vec<u8> {
        let [hi, lo] = id.to_be_bytes();
        vec![hi, lo, question]
    }
}

impl DnsCodec for FakeCodec {
    type Query = TestQuery;
    type Response = TestResponse;

    fn transaction_id(&self, query: &TestQuery) -> TransactionId {
        TransactionId::new(query.id)
    }

    fn encode(&self, query: &TestQuery) -> Result<Vec<u8>, QueryError> {
        Ok(Self::response_bytes(query.id, query.question))
    }

    fn decode(&self, wire: &[u8], query: &TestQuery) -> Result<TestResponse, QueryError> {
        match wire {
            [hi, lo, question] => Ok(TestResponse {
                id: u16::from_be_bytes([*hi, *lo]),
                question: *question,
                decoded_for: query.id,
            }),
            _ => Err(QueryError::Decode(format!(
                "expected 3 bytes, got {}",
                wire.len()
            ))),
        }
    }

    fn is_response_to(&self, query: &TestQuery, response: &TestResponse) -> bool {
        query.id == response.id && query.question == response.question
    }
}

// ── Transport ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    writes: Rc<RefCell<Vec<Bytes>>>,
    closed: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<Bytes> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl DnsTransport for RecordingTransport {
    fn write(&mut self, wire: Bytes) -> Result<(), QueryError> {
        if self.fail_writes.get() {
            return Err(QueryError::Transport("broken pipe".to_string()));
        }
        self.writes.borrow_mut().push(wire);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

#[derive(Debug, Default)]
pub struct RecordingConnector {
    pub attempts: Vec<UpstreamEndpoint>,
}

impl StreamConnector for RecordingConnector {
    fn connect(&mut self, endpoint: &UpstreamEndpoint) {
        self.attempts.push(*endpoint);
    }
}

// ── Virtual clock ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ManualTimer {
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

#[derive(Debug)]
struct ScheduledTimer {
    due: Instant,
    tag: TimerTag,
    active: Rc<Cell<bool>>,
}

/// Scheduler whose time only moves when a test calls [`ManualScheduler::advance`].
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: Rc<Cell<Instant>>,
    timers: Rc<RefCell<Vec<ScheduledTimer>>>,
    armed: Rc<RefCell<Vec<(TimerTag, Duration)>>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
            timers: Rc::new(RefCell::new(Vec::new())),
            armed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Moves time forward and returns the fired tags in due order. The
    /// caller delivers them to the client, as an event loop would.
    pub fn advance(&self, by: Duration) -> Vec<TimerTag> {
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

    pub fn active_timers(&self) -> usize {
        self.timers
            .borrow()
            .iter()
            .filter(|timer| timer.active.get())
            .count()
    }

    /// Every timer armed so far with its delay, in arming order.
    pub fn armed(&self) -> Vec<(TimerTag, Duration)> {
        self.armed.borrow().clone()
    }

    pub fn pending_tags(&self) -> Vec<TimerTag> {
        self.timers
            .borrow()
            .iter()
            .filter(|timer| timer.active.get())
            .map(|timer| timer.tag)
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualTimer;

    fn now(&self) -> Instant {
        self.now.get()
    }

    fn call_later(&self, delay: Duration, tag: TimerTag) -> ManualTimer {
        let active = Rc::new(Cell::new(true));
        self.armed.borrow_mut().push((tag, delay));
        self.timers.borrow_mut().push(ScheduledTimer {
            due: self.now.get() + delay,
            tag,
            active: active.clone(),
        });
        ManualTimer { active }
    }
}

pub fn tid(raw: u16) -> TransactionId {
    TransactionId::new(raw)
}

pub fn secs(value: u64) -> Option<Duration> {
    Some(Duration::from_secs(value))
}

pub fn frame(message: &[u8]) -> Vec<u8> {
    let mut framed = (message.len() as u16).to_be_bytes().to_vec();
    framed.extend_from_slice(message);
    framed
}
