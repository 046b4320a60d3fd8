//! tests/common/harness.rs
use bytes::Bytes;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing_subscriber::fmt::format::FmtSpan;
use update_coalescer::{CoalescerHandle, Config, DownstreamSender, StateMap, spawn};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "update_coalescer=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .init();
    });
}

/// A downstream call as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Directed { device: u16, payload: Bytes },
    Broadcast { payload: Bytes },
    Commit { state: StateMap<i64> },
}

#[derive(Debug, Default)]
pub struct TransportLog {
    pub calls: Vec<(Instant, Call)>,
    pub committed: Option<StateMap<i64>>,
}

/// An in-memory transport shared between the test and the coalescer actor.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl MemoryTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    /// Instants of the calls that went to `filter`.
    pub fn instants_where(&self, filter: impl Fn(&Call) -> bool) -> Vec<Instant> {
        self.log
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, call)| filter(call))
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn committed(&self) -> Option<StateMap<i64>> {
        self.log.lock().unwrap().committed.clone()
    }

    fn push(&self, call: Call) {
        self.log.lock().unwrap().calls.push((Instant::now(), call));
    }
}

impl DownstreamSender for MemoryTransport {
    type Recipient = u16;
    type Message = Bytes;
    type Value = i64;

    fn send_directed(&mut self, device: u16, payload: Bytes) {
        self.push(Call::Directed { device, payload });
    }

    fn send_broadcast(&mut self, payload: Bytes) {
        self.push(Call::Broadcast { payload });
    }

    fn commit_state_replace(&mut self, state: StateMap<i64>) {
        self.log.lock().unwrap().committed = Some(state.clone());
        self.push(Call::Commit { state });
    }

    fn committed_state(&self, device: Option<&u16>) -> Option<StateMap<i64>> {
        match device {
            None => self.committed(),
            Some(_) => None,
        }
    }
}

pub type Handle = CoalescerHandle<u16, Bytes, i64>;

/// A running coalescer actor wired to a [`MemoryTransport`].
pub struct TestHarness {
    pub handle: Handle,
    pub transport: MemoryTransport,
    pub join: JoinHandle<MemoryTransport>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        init_tracing();
        let transport = MemoryTransport::default();
        let (handle, join) = spawn(config, transport.clone()).unwrap();
        Self {
            handle,
            transport,
            join,
        }
    }

    /// Drops the handle and waits until the actor has flushed everything.
    pub async fn shutdown(self) -> MemoryTransport {
        drop(self.handle);
        self.join.await.unwrap()
    }
}

/// The largest number of instants inside any half-open window `(end - span, end]`.
pub fn max_in_any_window(instants: &[Instant], span: Duration) -> usize {
    instants
        .iter()
        .map(|end| {
            instants
                .iter()
                .filter(|at| *at <= end && end.saturating_duration_since(**at) < span)
                .count()
        })
        .max()
        .unwrap_or(0)
}
