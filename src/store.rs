//! 通道存储 - 管理每个通道的待处理操作及其合并
//! Channel Store - Manages per-channel pending operations and their merging
//!
//! 职责：
//! - 将提交合并到通道已有的待处理操作中，或将其入队
//! - 提供"如果所有待处理合并都已提交"时状态的只读视图
//! - 在刷新时取出队首操作
//!
//! 消息发送采用整体替换（每次刷新只能投递一个消息体），
//! 状态补丁采用逐字段合并（不同的生产者可以各自拥有不同的字段）。

use crate::channel::{Channel, Family, PendingOperation, StateMap, merge_fields};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::trace;


/// 提交结果
/// Outcome of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// 新的操作被加入队列
    /// A new operation was enqueued
    Queued,
    /// 提交被合并到已有的待处理操作中
    /// The submission was merged into an existing pending operation
    Coalesced,
}

/// 通道存储
/// Channel store
#[derive(Debug)]
pub struct ChannelStore<R, M, V> {
    /// 每个通道最多为每个操作族保留一个待处理操作
    /// Each channel holds at most one pending operation per family
    queues: HashMap<Channel<R>, VecDeque<PendingOperation<R, M, V>>>,
}

impl<R, M, V> ChannelStore<R, M, V>
where
    R: Clone + Eq + Hash,
{
    /// 创建空的通道存储
    /// Create an empty channel store
    pub fn new() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }

    /// 提交消息发送。已有的待处理消息的载荷被整体替换。
    /// Submit a message send. An existing pending message has its payload replaced.
    pub fn submit_send(&mut self, channel: &Channel<R>, payload: M) -> Submission {
        let queue = self.queues.entry(channel.clone()).or_default();

        for pending in queue.iter_mut() {
            match pending {
                PendingOperation::DirectedSend { payload: current, .. }
                | PendingOperation::BroadcastSend { payload: current } => {
                    *current = payload;
                    trace!("Pending message replaced");
                    return Submission::Coalesced;
                }
                _ => {}
            }
        }

        let operation = match channel {
            Channel::Directed(recipient) => PendingOperation::DirectedSend {
                recipient: recipient.clone(),
                payload,
            },
            Channel::Broadcast => PendingOperation::BroadcastSend { payload },
        };
        queue.push_back(operation);
        Submission::Queued
    }

    /// 提交状态补丁。已有待处理状态的字段被逐个覆盖，未出现的字段保持不变。
    /// Submit a state patch. Fields of an existing pending state are overwritten
    /// one by one; fields absent from `fields` are left untouched.
    pub fn submit_state_patch(&mut self, channel: &Channel<R>, fields: StateMap<V>) -> Submission {
        let queue = self.queues.entry(channel.clone()).or_default();

        for pending in queue.iter_mut() {
            match pending {
                // 替换之后的补丁仍然是替换，只是字段被覆盖
                // A patch after a replace stays a replace with the fields overlaid
                PendingOperation::StatePatch { patch: current }
                | PendingOperation::StateReplace { state: current } => {
                    merge_fields(current, fields);
                    trace!("Pending state patched");
                    return Submission::Coalesced;
                }
                _ => {}
            }
        }

        queue.push_back(PendingOperation::StatePatch { patch: fields });
        Submission::Queued
    }

    /// 提交完整状态替换，丢弃之前合并的所有补丁。
    /// Submit a full state replace, discarding any previously merged patch.
    pub fn submit_state_replace(&mut self, channel: &Channel<R>, state: StateMap<V>) -> Submission {
        let queue = self.queues.entry(channel.clone()).or_default();

        if let Some(pending) = queue.iter_mut().find(|op| op.family() == Family::State) {
            *pending = PendingOperation::StateReplace { state };
            trace!("Pending state replaced");
            return Submission::Coalesced;
        }

        queue.push_back(PendingOperation::StateReplace { state });
        Submission::Queued
    }

    /// 返回读者此刻应观察到的状态：
    /// - 待处理替换：原样返回其载荷
    /// - 待处理补丁：在 `last_committed` 之上覆盖补丁字段
    /// - 无待处理状态：原样返回 `last_committed`
    ///
    /// Returns the state a reader should observe right now:
    /// - pending replace: its payload verbatim
    /// - pending patch: `last_committed` with the patch fields overlaid
    /// - nothing pending: `last_committed` unchanged
    pub fn peek_merged_state(
        &self,
        channel: &Channel<R>,
        last_committed: Option<StateMap<V>>,
    ) -> Option<StateMap<V>>
    where
        V: Clone,
    {
        match self.pending_state(channel) {
            Some(PendingOperation::StateReplace { state }) => Some(state.clone()),
            Some(PendingOperation::StatePatch { patch }) => {
                let mut merged = last_committed.unwrap_or_default();
                merge_fields(&mut merged, patch.clone());
                Some(merged)
            }
            _ => last_committed,
        }
    }

    /// 取出通道的队首操作用于刷新。队列为空时移除该通道。
    /// Remove and return the channel's head operation for flushing. The channel
    /// entry is dropped once its queue is empty.
    pub fn take_and_clear(&mut self, channel: &Channel<R>) -> Option<PendingOperation<R, M, V>> {
        let queue = self.queues.get_mut(channel)?;
        let operation = queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(channel);
        }
        operation
    }

    /// 通道上的待处理操作，按刷新顺序排列
    /// Pending operations on a channel, in flush order
    pub fn pending(&self, channel: &Channel<R>) -> impl Iterator<Item = &PendingOperation<R, M, V>> {
        self.queues.get(channel).into_iter().flatten()
    }

    /// 通道上待处理的状态更新
    /// The pending state update on a channel
    pub fn pending_state(&self, channel: &Channel<R>) -> Option<&PendingOperation<R, M, V>> {
        self.pending(channel).find(|op| op.family() == Family::State)
    }

    pub fn has_pending(&self, channel: &Channel<R>) -> bool {
        self.queues.get(channel).is_some_and(|queue| !queue.is_empty())
    }

    /// 所有通道上待处理操作的总数
    /// Total number of pending operations across all channels
    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl<R, M, V> Default for ChannelStore<R, M, V>
where
    R: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
