//! 速率受限的更新合并器
//! Rate-limited update coalescer
//!
//! [`Coalescer`] 将通道存储、速率调度器、下游发送者和时钟组合在一起。
//! 所有提交都同步完成且从不阻塞；实际的刷新在定时器到期后由
//! [`Coalescer::fire_due`] 执行。
//!
//! [`Coalescer`] wires the channel store, the rate scheduler, the downstream
//! sender and a clock together. Every submission completes synchronously and
//! never blocks; the actual flush happens when [`Coalescer::fire_due`] is
//! called after a timer deadline has passed.

mod stats;


pub use stats::CoalescerStats;

use crate::{
    channel::{Channel, PendingOperation, StateMap},
    clock::{Clock, TokioClock},
    config::Config,
    error::Result,
    scheduler::RateScheduler,
    sender::DownstreamSender,
    store::{ChannelStore, Submission},
};
use tokio::time::Instant;
use tracing::{debug, trace};

type Recipient<S> = <S as DownstreamSender>::Recipient;
type Message<S> = <S as DownstreamSender>::Message;
type Value<S> = <S as DownstreamSender>::Value;

/// A rate-limited update coalescer.
///
/// Updates submitted for the same channel are merged while a flush is pending,
/// and flushes per channel never exceed the configured rate.
///
/// 速率受限的更新合并器。
///
/// 刷新挂起期间提交到同一通道的更新会被合并，每个通道的刷新频率不会超过配置的速率。
pub struct Coalescer<S: DownstreamSender, C: Clock = TokioClock> {
    store: ChannelStore<Recipient<S>, Message<S>, Value<S>>,
    scheduler: RateScheduler<Recipient<S>>,
    sender: S,
    clock: C,
    stats: CoalescerStats,
}

impl<S: DownstreamSender> Coalescer<S, TokioClock> {
    /// Creates a coalescer reading time from tokio's clock.
    pub fn with_tokio_clock(config: Config, sender: S) -> Result<Self> {
        Self::new(config, sender, TokioClock)
    }
}

impl<S: DownstreamSender, C: Clock> Coalescer<S, C> {
    /// Creates a coalescer. Fails with
    /// [`Error::InvalidConfiguration`](crate::error::Error::InvalidConfiguration)
    /// when the rate limit leaves no room above the burst allowance.
    ///
    /// 创建合并器。速率上限不大于突发额度时返回配置错误。
    pub fn new(config: Config, sender: S, clock: C) -> Result<Self> {
        let config = config.validated()?;
        debug!(
            rate_limit = config.rate_limit,
            burst_allowance = config.burst_allowance,
            throttle_reset = ?config.throttle_reset,
            "Coalescer created"
        );
        Ok(Self {
            store: ChannelStore::new(),
            scheduler: RateScheduler::new(config),
            sender,
            clock,
            stats: CoalescerStats::default(),
        })
    }

    /// Sends `payload` to `recipient`, or broadcasts it when `recipient` is
    /// `None`. A message still pending on the channel is replaced.
    ///
    /// 向 `recipient` 发送消息；为 `None` 时广播。通道上仍待处理的消息会被替换。
    pub fn submit_message(&mut self, recipient: Option<Recipient<S>>, payload: Message<S>) {
        let channel = Channel::for_recipient(recipient);
        let submission = self.store.submit_send(&channel, payload);
        self.submitted(&channel, submission);
    }

    /// Broadcasts `payload` to every recipient.
    pub fn broadcast_message(&mut self, payload: Message<S>) {
        self.submit_message(None, payload);
    }

    /// Replaces the whole shared state. Any pending field updates are discarded.
    ///
    /// 替换整个共享状态，丢弃所有待处理的字段更新。
    pub fn set_state(&mut self, state: StateMap<Value<S>>) {
        let channel = Channel::Broadcast;
        let submission = self.store.submit_state_replace(&channel, state);
        self.submitted(&channel, submission);
    }

    /// Sets a single field of the shared state, leaving other fields untouched.
    ///
    /// 设置共享状态的单个字段，其他字段保持不变。
    pub fn set_state_field(&mut self, key: impl Into<String>, value: Value<S>) {
        let mut fields = StateMap::new();
        fields.insert(key.into(), value);
        self.set_state_fields(fields);
    }

    /// Sets several fields of the shared state at once.
    pub fn set_state_fields(&mut self, fields: StateMap<Value<S>>) {
        let channel = Channel::Broadcast;
        let submission = self.store.submit_state_patch(&channel, fields);
        self.submitted(&channel, submission);
    }

    /// Returns the up-to-date shared state of `recipient`, including updates
    /// that have not been flushed yet. `None` reads the local state.
    ///
    /// 返回 `recipient` 的最新共享状态，包括尚未刷新的更新。`None` 表示读取本地状态。
    pub fn get_state(&self, recipient: Option<&Recipient<S>>) -> Option<StateMap<Value<S>>> {
        let local = match recipient {
            None => true,
            Some(recipient) => self.sender.local_recipient().as_ref() == Some(recipient),
        };

        if local && self.store.pending_state(&Channel::Broadcast).is_some() {
            let committed = self.sender.committed_state(None);
            return self.store.peek_merged_state(&Channel::Broadcast, committed);
        }
        self.sender.committed_state(recipient)
    }

    /// Flushes every channel whose timer has expired. Returns the number of
    /// operations handed to the sender.
    ///
    /// 刷新所有定时器已到期的通道，返回交给发送者的操作数。
    pub fn fire_due(&mut self) -> usize {
        let now = self.clock.now();
        let due = self.scheduler.expired(now);

        let mut flushed = 0;
        for channel in due {
            if self.flush(&channel, now) {
                flushed += 1;
            }
        }
        flushed
    }

    /// The earliest instant at which [`fire_due`](Self::fire_due) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Whether any operation is still waiting to be flushed.
    pub fn has_pending(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn stats(&self) -> CoalescerStats {
        self.stats
    }

    pub fn config(&self) -> &Config {
        self.scheduler.config()
    }

    #[cfg(test)]
    pub(crate) fn scheduler(&self) -> &RateScheduler<Recipient<S>> {
        &self.scheduler
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn sender_mut(&mut self) -> &mut S {
        &mut self.sender
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Consumes the coalescer, returning the sender. Pending operations are dropped.
    pub fn into_sender(self) -> S {
        self.sender
    }

    fn submitted(&mut self, channel: &Channel<Recipient<S>>, submission: Submission) {
        self.stats.submitted += 1;
        if submission == Submission::Coalesced {
            self.stats.coalesced += 1;
        }

        let now = self.clock.now();
        if let Some(delay) = self.scheduler.request_flush(channel, now) {
            trace!(channel = ?channel, delay = ?delay, "Submission scheduled");
        }
    }

    fn flush(&mut self, channel: &Channel<Recipient<S>>, now: Instant) -> bool {
        let Some(operation) = self.store.take_and_clear(channel) else {
            return false;
        };
        self.scheduler.record_send(channel, now);
        self.stats.flushed += 1;

        debug!(channel = ?channel, kind = ?operation.kind(), "Flushing pending operation");
        self.dispatch(operation);

        // 广播通道可能同时排有消息和状态更新
        // The broadcast channel may have both a message and a state update queued
        if self.store.has_pending(channel) {
            self.scheduler.request_flush(channel, now);
        }
        true
    }

    fn dispatch(&mut self, operation: PendingOperation<Recipient<S>, Message<S>, Value<S>>) {
        match operation {
            PendingOperation::DirectedSend { recipient, payload } => {
                self.sender.send_directed(recipient, payload)
            }
            PendingOperation::BroadcastSend { payload } => self.sender.send_broadcast(payload),
            PendingOperation::StateReplace { state } => self.sender.commit_state_replace(state),
            PendingOperation::StatePatch { patch } => self.sender.commit_state_patch(patch),
        }
    }
}
