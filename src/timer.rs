//! 一次性定时器队列
//! One-shot timer queue
//!
//! 该模块实现了按到期时间排序的定时器队列。推进时按 (到期时间, 注册顺序)
//! 返回所有已到期的事件。
//!
//! This module implements a deadline-ordered timer queue. Advancing the queue
//! yields every expired event ordered by (deadline, registration order).

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;


/// 一次性定时器队列
/// One-shot timer queue
#[derive(Debug)]
pub struct TimerQueue<E> {
    /// 按 (到期时间, 注册序号) 排序的定时器
    /// Timers ordered by (deadline, registration sequence)
    entries: BTreeMap<(Instant, u64), E>,
    /// 下一个注册序号
    /// Next registration sequence number
    next_seq: u64,
}

impl<E> TimerQueue<E> {
    /// 创建空的定时器队列
    /// Create an empty timer queue
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// 注册在 `deadline` 到期的定时器
    /// Register a timer that expires at `deadline`
    pub fn schedule(&mut self, deadline: Instant, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries.insert((deadline, seq), event);
        trace!(timer = seq, "Timer scheduled");
    }

    /// 注册在 `now + delay` 到期的定时器
    /// Register a timer that expires `delay` after `now`
    pub fn schedule_after(&mut self, now: Instant, delay: Duration, event: E) {
        self.schedule(now + delay, event);
    }

    /// 最早的到期时间
    /// Earliest deadline in the queue
    pub fn next_expiry(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// 弹出所有在 `now` 或之前到期的定时器
    /// Pop every timer whose deadline is at or before `now`
    pub fn advance(&mut self, now: Instant) -> Vec<E> {
        let mut expired = Vec::new();

        while let Some(entry) = self.entries.first_entry() {
            let (deadline, _) = *entry.key();
            if deadline > now {
                break;
            }
            expired.push(entry.remove());
        }

        if !expired.is_empty() {
            trace!(count = expired.len(), "Timers expired");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
