//! The public handle to a running coalescer actor.

use super::command::CoalescerCommand;
use crate::channel::StateMap;
use crate::coalescer::CoalescerStats;
use crate::error::{Error, Result};
use tokio::sync::{mpsc, oneshot};

/// A cloneable handle to a coalescer running in its own task.
///
/// Submissions are queued on an unbounded channel and return immediately;
/// they only fail when the actor has stopped.
///
/// 运行在独立任务中的合并器的可克隆句柄。
///
/// 提交被放入无界通道并立即返回；只有在 actor 已停止时才会失败。
#[derive(Debug)]
pub struct CoalescerHandle<R, M, V> {
    command_tx: mpsc::UnboundedSender<CoalescerCommand<R, M, V>>,
}

impl<R, M, V> Clone for CoalescerHandle<R, M, V> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
        }
    }
}

impl<R, M, V> CoalescerHandle<R, M, V> {
    pub(crate) fn new(command_tx: mpsc::UnboundedSender<CoalescerCommand<R, M, V>>) -> Self {
        Self { command_tx }
    }

    /// Sends `payload` to `recipient`, or broadcasts it when `recipient` is `None`.
    /// 向 `recipient` 发送消息；为 `None` 时广播。
    pub fn submit_message(&self, recipient: Option<R>, payload: M) -> Result<()> {
        self.send(CoalescerCommand::SubmitMessage { recipient, payload })
    }

    /// Broadcasts `payload` to every recipient.
    pub fn broadcast_message(&self, payload: M) -> Result<()> {
        self.submit_message(None, payload)
    }

    /// Replaces the whole shared state.
    /// 替换整个共享状态。
    pub fn set_state(&self, state: StateMap<V>) -> Result<()> {
        self.send(CoalescerCommand::SetState { state })
    }

    /// Sets a single field of the shared state.
    /// 设置共享状态的单个字段。
    pub fn set_state_field(&self, key: impl Into<String>, value: V) -> Result<()> {
        let mut fields = StateMap::new();
        fields.insert(key.into(), value);
        self.set_state_fields(fields)
    }

    /// Sets several fields of the shared state.
    pub fn set_state_fields(&self, fields: StateMap<V>) -> Result<()> {
        self.send(CoalescerCommand::SetStateFields { fields })
    }

    /// Reads the up-to-date state of `recipient`, including pending updates.
    /// `None` reads the local state.
    ///
    /// 读取 `recipient` 的最新状态，包括待处理的更新。`None` 表示本地状态。
    pub async fn get_state(&self, recipient: Option<R>) -> Result<Option<StateMap<V>>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(CoalescerCommand::GetState {
            recipient,
            response_tx,
        })?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Reads the coalescer statistics.
    pub async fn stats(&self) -> Result<CoalescerStats> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(CoalescerCommand::Stats { response_tx })?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    fn send(&self, command: CoalescerCommand<R, M, V>) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::ChannelClosed)
    }
}
