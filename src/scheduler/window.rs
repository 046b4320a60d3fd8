//! 速率窗口 - 记录通道在最近一秒内的发送时刻
//! Rate window - records a channel's send instants over the trailing second

use crate::config::RATE_WINDOW;
use std::collections::VecDeque;
use tokio::time::Instant;

/// 速率窗口
/// Rate window
#[derive(Debug, Clone, Default)]
pub struct RateWindow {
    /// 发送时刻，单调不减
    /// Send instants, monotonically non-decreasing
    sends: VecDeque<Instant>,
    /// 通道是否已进入稳态节流
    /// Whether the channel has entered steady-state throttling
    throttled: bool,
}

impl RateWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 丢弃早于 `now - RATE_WINDOW` 的发送时刻
    /// Drop send instants older than `now - RATE_WINDOW`
    pub fn prune(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(RATE_WINDOW) else {
            return;
        };
        while self.sends.front().is_some_and(|sent| *sent < cutoff) {
            self.sends.pop_front();
        }
    }

    /// 记录一次发送。时钟回退时沿用上一次的时刻，保持单调。
    /// Record a send. A clock that steps backwards reuses the last instant to
    /// stay monotonic.
    pub fn record(&mut self, now: Instant) {
        let at = self.sends.back().map_or(now, |last| now.max(*last));
        self.sends.push_back(at);
    }

    pub fn len(&self) -> usize {
        self.sends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sends.is_empty()
    }

    /// 最近一次发送
    /// Most recent send
    pub fn last_send(&self) -> Option<Instant> {
        self.sends.back().copied()
    }

    /// 窗口中最早的两次发送
    /// The two oldest sends still in the window
    pub fn oldest_pair(&self) -> Option<(Instant, Instant)> {
        match (self.sends.front(), self.sends.get(1)) {
            (Some(first), Some(second)) => Some((*first, *second)),
            _ => None,
        }
    }

    pub fn sends(&self) -> impl Iterator<Item = Instant> + '_ {
        self.sends.iter().copied()
    }

    pub fn is_throttled(&self) -> bool {
        self.throttled
    }

    pub(crate) fn set_throttled(&mut self, throttled: bool) {
        self.throttled = throttled;
    }
}
