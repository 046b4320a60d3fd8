//! The downstream capability the coalescer flushes into.
//!
//! 合并器刷新时调用的下游能力。

use crate::channel::{StateMap, merge_fields};
use std::fmt::Debug;
use std::hash::Hash;

/// The transport side of the coalescer, implemented by the host application.
///
/// The coalescer only decides what to send and when; delivery, retries and
/// error handling belong to the implementor. Once an operation has been handed
/// to one of these methods the coalescer no longer owns it.
///
/// 合并器的传输侧，由宿主应用实现。
///
/// 合并器只决定发送什么以及何时发送；投递、重试和错误处理由实现者负责。
/// 操作一旦交给这些方法，合并器便不再拥有它。
pub trait DownstreamSender {
    /// Identifies a directed recipient.
    type Recipient: Clone + Eq + Hash + Debug;
    /// Opaque message payload.
    type Message;
    /// Value stored in a shared-state field.
    type Value: Clone;

    /// Sends a message to one recipient.
    /// 向一个接收者发送消息。
    fn send_directed(&mut self, recipient: Self::Recipient, payload: Self::Message);

    /// Sends a message to every recipient.
    /// 向所有接收者广播消息。
    fn send_broadcast(&mut self, payload: Self::Message);

    /// Commits `state` as the complete shared state.
    /// 将 `state` 作为完整的共享状态提交。
    fn commit_state_replace(&mut self, state: StateMap<Self::Value>);

    /// Commits a partial update.
    ///
    /// A patch never captured a full snapshot, so the default implementation
    /// overlays it on [`committed_state`](Self::committed_state) and commits the
    /// result as a replace. With nothing committed yet the patch alone is
    /// committed. Override when the transport supports partial updates natively.
    ///
    /// 提交部分更新。默认实现将补丁覆盖到已提交状态上，再以替换方式提交。
    fn commit_state_patch(&mut self, patch: StateMap<Self::Value>) {
        let state = match self.committed_state(None) {
            Some(mut committed) => {
                merge_fields(&mut committed, patch);
                committed
            }
            None => patch,
        };
        self.commit_state_replace(state);
    }

    /// The last committed shared state of `recipient`, or of the local device
    /// when `recipient` is `None`.
    ///
    /// `recipient` 最后提交的共享状态；为 `None` 时返回本地设备的状态。
    fn committed_state(&self, recipient: Option<&Self::Recipient>)
    -> Option<StateMap<Self::Value>>;

    /// The recipient id of the local device, if it has one. Reading the state
    /// of this recipient includes pending local updates.
    fn local_recipient(&self) -> Option<Self::Recipient> {
        None
    }
}
