//! 时钟抽象
//! Clock abstraction
//!
//! 调度器只通过 [`Clock`] 读取时间，因此可以在测试中使用手动推进的时钟。
//!
//! The scheduler only reads time through [`Clock`], so tests can drive it with
//! a manually advanced clock instead of wall-clock time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A monotonic time source.
///
/// 单调时间源。
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Reads `tokio::time::Instant::now()`, which follows `tokio::time::pause`
/// and `tokio::time::advance` inside a paused test runtime.
///
/// 读取 `tokio::time::Instant::now()`，在暂停的测试运行时中跟随 `pause` 与 `advance`。
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
///
/// 只在显式推进时才前进的时钟。克隆体共享同一时间。
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock frozen at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `by`.
    /// 将时钟向前推进 `by`。
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
