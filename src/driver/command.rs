//! Commands sent from a `CoalescerHandle` to the actor.

use crate::channel::StateMap;
use crate::coalescer::CoalescerStats;
use tokio::sync::oneshot;

/// Commands sent to the `CoalescerActor`.
///
/// 发送到 `CoalescerActor` 的命令。
#[derive(Debug)]
pub(crate) enum CoalescerCommand<R, M, V> {
    /// Send a message to a recipient, or broadcast it when `recipient` is `None`.
    /// 向接收者发送消息；`recipient` 为 `None` 时广播。
    SubmitMessage { recipient: Option<R>, payload: M },
    /// Replace the whole shared state.
    /// 替换整个共享状态。
    SetState { state: StateMap<V> },
    /// Update some fields of the shared state.
    /// 更新共享状态的部分字段。
    SetStateFields { fields: StateMap<V> },
    /// Read the up-to-date state of a recipient.
    /// 读取接收者的最新状态。
    GetState {
        recipient: Option<R>,
        response_tx: oneshot::Sender<Option<StateMap<V>>>,
    },
    /// Read the coalescer statistics.
    Stats {
        response_tx: oneshot::Sender<CoalescerStats>,
    },
}
