//! 速率调度器 - 决定通道的下一次刷新何时发生
//! Rate Scheduler - Decides when a channel's next flush may happen
//!
//! 每个通道维护一个一秒滑动窗口。窗口内的发送数少于突发额度时立即刷新；
//! 之后按 `1000ms / (rate_limit - burst_allowance)` 的稳态间隔发送，
//! 当突发发送离开窗口、窗口内最早的两次发送间隔达到稳态间隔后，
//! 通道进入节流状态并改用 `1000ms / rate_limit` 的严格间隔。
//! 默认情况下节流是粘性的：即使空闲之后，通道也不会重新获得突发额度。
//!
//! Every channel keeps a one second sliding window. While the window holds
//! fewer sends than the burst allowance, flushes are immediate. Past the burst
//! the channel is paced at `1000ms / (rate_limit - burst_allowance)`; once the
//! burst sends have left the window and the two oldest remaining sends are
//! spaced at least that far apart, the channel is throttled and switches to
//! strict `1000ms / rate_limit` pacing. By default the throttle is sticky: a
//! channel does not regain its burst allowance even after going idle.

mod window;


pub use window::RateWindow;

use crate::channel::Channel;
use crate::config::{Config, ThrottleReset};
use crate::timer::TimerQueue;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// 速率调度器
/// Rate scheduler
#[derive(Debug)]
pub struct RateScheduler<R> {
    config: Config,
    /// 每个通道的速率窗口，在第一次刷新时创建
    /// Per-channel rate windows, created on a channel's first flush
    windows: HashMap<Channel<R>, RateWindow>,
    /// 每个通道至多一个已挂起的定时器
    /// At most one armed timer per channel
    armed: HashSet<Channel<R>>,
    timers: TimerQueue<Channel<R>>,
}

impl<R> RateScheduler<R>
where
    R: Clone + Eq + Hash + Debug,
{
    /// Creates a scheduler for an already validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            windows: HashMap::new(),
            armed: HashSet::new(),
            timers: TimerQueue::new(),
        }
    }

    /// 请求刷新通道。若通道已有挂起的定时器则不做任何事并返回 `None`，
    /// 否则挂起一个定时器并返回其延迟。
    ///
    /// Request a flush of `channel`. Does nothing and returns `None` when a
    /// timer is already armed for the channel; otherwise arms one and returns
    /// its delay.
    pub fn request_flush(&mut self, channel: &Channel<R>, now: Instant) -> Option<Duration> {
        if self.armed.contains(channel) {
            return None;
        }

        let delay = self.flush_delay(channel, now);
        self.timers.schedule_after(now, delay, channel.clone());
        self.armed.insert(channel.clone());

        trace!(
            channel = ?channel,
            delay_ms = delay.as_secs_f64() * 1000.0,
            "Flush armed"
        );
        Some(delay)
    }

    /// 计算通道下一次刷新前需要等待的时间。会修剪窗口并可能设置节流标志。
    /// Compute how long the channel must wait before its next flush. Prunes the
    /// window and may set the throttled flag.
    pub fn flush_delay(&mut self, channel: &Channel<R>, now: Instant) -> Duration {
        let burst = self.config.burst_allowance as usize;
        let steady = self.config.steady_delay();
        let strict = self.config.throttled_delay();
        let reset = self.config.throttle_reset;

        let Some(window) = self.windows.get_mut(channel) else {
            // 从未刷新过的通道：窗口为空
            // Never flushed: the window is empty
            return Duration::ZERO;
        };
        window.prune(now);

        // 粘性节流的通道不再享有突发额度
        // A channel with a sticky throttle never regains its burst allowance
        let sticky = reset == ThrottleReset::Sticky && window.is_throttled();
        if window.len() < burst && !sticky {
            if reset == ThrottleReset::OnBurstRecovery && window.is_throttled() {
                window.set_throttled(false);
                debug!(channel = ?channel, "Burst allowance recovered, throttle cleared");
            }
            return Duration::ZERO;
        }

        if !window.is_throttled()
            && let Some((first, second)) = window.oldest_pair()
            && second.saturating_duration_since(first) >= steady
        {
            window.set_throttled(true);
            debug!(channel = ?channel, "Channel reached steady rate, throttling");
        }

        let interval = if window.is_throttled() { strict } else { steady };
        match window.last_send() {
            Some(last) => interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// 弹出所有已到期的通道并解除其定时器。
    /// Pop every channel whose timer has expired and disarm it.
    pub fn expired(&mut self, now: Instant) -> Vec<Channel<R>> {
        self.timers
            .advance(now)
            .into_iter()
            .inspect(|channel| {
                self.armed.remove(channel);
            })
            .collect()
    }

    /// 记录一次发送到通道的速率窗口
    /// Record a send into the channel's rate window
    pub fn record_send(&mut self, channel: &Channel<R>, now: Instant) {
        self.windows.entry(channel.clone()).or_default().record(now);
    }

    pub fn is_armed(&self, channel: &Channel<R>) -> bool {
        self.armed.contains(channel)
    }

    /// 最早的已挂起刷新时间
    /// Earliest armed flush deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_expiry()
    }

    pub fn window(&self, channel: &Channel<R>) -> Option<&RateWindow> {
        self.windows.get(channel)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
