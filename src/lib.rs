#![deny(clippy::expect_used, clippy::unwrap_used)]

//! A rate-limited update coalescer.
//! 速率受限的更新合并器。
//!
//! Callers submit messages and shared-state updates as often as they like.
//! Updates for the same channel are merged while a flush is pending, and each
//! channel is flushed to the [`DownstreamSender`] at most `rate_limit` times
//! per second, after an initial burst that goes out without delay.
//!
//! [`Coalescer`] is the synchronous core; [`driver::spawn`] runs one inside a
//! tokio task behind a cloneable [`CoalescerHandle`].

pub mod channel;
pub mod clock;
pub mod coalescer;
pub mod config;
pub mod driver;
pub mod error;
pub mod scheduler;
pub mod sender;
pub mod store;
pub mod timer;

mod testing;

pub use channel::{Channel, OperationKind, PendingOperation, StateMap};
pub use clock::{Clock, ManualClock, TokioClock};
pub use coalescer::{Coalescer, CoalescerStats};
pub use config::{Config, ThrottleReset};
pub use driver::{CoalescerHandle, spawn};
pub use error::{Error, Result};
pub use sender::DownstreamSender;
