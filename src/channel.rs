//! Channels and the operations queued on them.
//!
//! 通道以及排队在其上的操作。

use std::collections::BTreeMap;

/// Shared state as a mapping from field name to value.
/// 以字段名到值的映射表示的共享状态。
pub type StateMap<V> = BTreeMap<String, V>;

/// Overlays every field of `patch` onto `target`. Fields absent from `patch`
/// are left untouched.
///
/// 将 `patch` 的每个字段覆盖到 `target` 上，`patch` 中不存在的字段保持不变。
pub fn merge_fields<V>(target: &mut StateMap<V>, patch: StateMap<V>) {
    target.extend(patch);
}

/// An independent destination for updates, with its own queue and rate window.
///
/// 更新的独立目标，拥有自己的队列和速率窗口。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel<R> {
    /// Updates for one specific recipient.
    /// 发往特定接收者的更新。
    Directed(R),
    /// Broadcast messages and the local shared state.
    /// 广播消息和本地共享状态。
    Broadcast,
}

impl<R> Channel<R> {
    /// Routes an optional recipient: `None` is the broadcast channel.
    pub fn for_recipient(recipient: Option<R>) -> Self {
        match recipient {
            Some(recipient) => Channel::Directed(recipient),
            None => Channel::Broadcast,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Channel::Broadcast)
    }
}

/// The kind of a pending operation.
/// 待处理操作的类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    DirectedSend,
    BroadcastSend,
    StateReplace,
    StatePatch,
}

/// Operations merge only with operations of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Message,
    State,
}

/// An update waiting for its channel's next flush.
///
/// Message sends carry an opaque payload that is replaced wholesale on merge.
/// State updates carry a field map; a patch merges field by field while a
/// replace is committed verbatim.
///
/// 等待通道下一次刷新的更新。
///
/// 消息发送携带不透明载荷，合并时整体替换。状态更新携带字段映射：
/// 补丁逐字段合并，替换则原样提交。
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation<R, M, V> {
    DirectedSend { recipient: R, payload: M },
    BroadcastSend { payload: M },
    StateReplace { state: StateMap<V> },
    StatePatch { patch: StateMap<V> },
}

impl<R, M, V> PendingOperation<R, M, V> {
    pub fn kind(&self) -> OperationKind {
        match self {
            PendingOperation::DirectedSend { .. } => OperationKind::DirectedSend,
            PendingOperation::BroadcastSend { .. } => OperationKind::BroadcastSend,
            PendingOperation::StateReplace { .. } => OperationKind::StateReplace,
            PendingOperation::StatePatch { .. } => OperationKind::StatePatch,
        }
    }

    /// True when the payload must be committed verbatim instead of merged
    /// with the last committed state.
    pub fn replaces_entirely(&self) -> bool {
        matches!(self, PendingOperation::StateReplace { .. })
    }

    pub(crate) fn family(&self) -> Family {
        match self {
            PendingOperation::DirectedSend { .. } | PendingOperation::BroadcastSend { .. } => {
                Family::Message
            }
            PendingOperation::StateReplace { .. } | PendingOperation::StatePatch { .. } => {
                Family::State
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fields_last_value_wins() {
        let mut target: StateMap<i32> = [("a".to_string(), 1), ("b".to_string(), 2)].into();
        merge_fields(&mut target, [("a".to_string(), 3), ("c".to_string(), 4)].into());
        let expected: StateMap<i32> = [
            ("a".to_string(), 3),
            ("b".to_string(), 2),
            ("c".to_string(), 4),
        ]
        .into();
        assert_eq!(target, expected);
    }

    #[test]
    fn test_channel_routing() {
        assert_eq!(Channel::for_recipient(Some(3u32)), Channel::Directed(3));
        assert!(Channel::<u32>::for_recipient(None).is_broadcast());
    }

    #[test]
    fn test_operation_kinds() {
        let op: PendingOperation<u32, &str, i32> = PendingOperation::StateReplace {
            state: StateMap::new(),
        };
        assert_eq!(op.kind(), OperationKind::StateReplace);
        assert!(op.replaces_entirely());
        assert_eq!(op.family(), Family::State);

        let op: PendingOperation<u32, &str, i32> = PendingOperation::DirectedSend {
            recipient: 1,
            payload: "hi",
        };
        assert_eq!(op.kind(), OperationKind::DirectedSend);
        assert!(!op.replaces_entirely());
        assert_eq!(op.family(), Family::Message);
    }
}
