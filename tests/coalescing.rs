//! 更新合并与状态读取的集成测试
//! Integration tests for update coalescing and state read-back

pub mod common;

use bytes::Bytes;
use common::harness::{Call, TestHarness};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use update_coalescer::StateMap;

fn state(fields: &[(&str, i64)]) -> StateMap<i64> {
    fields
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

fn commits(calls: &[Call]) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, Call::Commit { .. }))
        .count()
}

/// 用掉空闲广播通道的突发额度，使后续更新必须排队
async fn exhaust_burst(harness: &TestHarness) {
    for payload in ["a", "b"] {
        harness
            .handle
            .broadcast_message(Bytes::from(payload))
            .unwrap();
        sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_pending_state_is_readable_before_commit() {
    let harness = TestHarness::new();
    exhaust_burst(&harness).await;

    harness.handle.broadcast_message(Bytes::from("c")).unwrap();
    harness.handle.set_state_field("x", 5).unwrap();

    assert_eq!(
        harness.handle.get_state(None).await.unwrap(),
        Some(state(&[("x", 5)]))
    );
    assert_eq!(harness.transport.committed(), None);

    let transport = harness.shutdown().await;
    assert_eq!(transport.committed(), Some(state(&[("x", 5)])));
    assert_eq!(
        transport.calls(),
        vec![
            Call::Broadcast {
                payload: Bytes::from("a")
            },
            Call::Broadcast {
                payload: Bytes::from("b")
            },
            Call::Broadcast {
                payload: Bytes::from("c")
            },
            Call::Commit {
                state: state(&[("x", 5)])
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_field_updates_collapse_into_one_commit() {
    let harness = TestHarness::new();
    exhaust_burst(&harness).await;

    let mut expected = BTreeMap::new();
    for i in 0..10 {
        let key = format!("k{i}");
        harness.handle.set_state_field(key.clone(), i).unwrap();
        expected.insert(key, i);
    }

    let transport = harness.shutdown().await;
    assert_eq!(commits(&transport.calls()), 1);
    assert_eq!(transport.committed(), Some(expected));
}

#[tokio::test(start_paused = true)]
async fn test_later_field_wins_over_earlier_value() {
    let harness = TestHarness::new();
    exhaust_burst(&harness).await;

    for value in 0..20 {
        harness.handle.set_state_field("counter", value).unwrap();
    }

    let transport = harness.shutdown().await;
    assert_eq!(commits(&transport.calls()), 1);
    assert_eq!(transport.committed(), Some(state(&[("counter", 19)])));
}

#[tokio::test(start_paused = true)]
async fn test_field_update_after_replace_extends_it() {
    let harness = TestHarness::new();

    harness.handle.set_state(state(&[("a", 1)])).unwrap();
    harness.handle.set_state_field("b", 2).unwrap();

    let transport = harness.shutdown().await;
    assert_eq!(transport.committed(), Some(state(&[("a", 1), ("b", 2)])));
}

#[tokio::test(start_paused = true)]
async fn test_field_update_merges_over_committed_state() {
    let harness = TestHarness::new();

    harness.handle.set_state(state(&[("a", 1), ("b", 1)])).unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(
        harness.transport.committed(),
        Some(state(&[("a", 1), ("b", 1)]))
    );

    harness.handle.set_state_field("b", 2).unwrap();
    assert_eq!(
        harness.handle.get_state(None).await.unwrap(),
        Some(state(&[("a", 1), ("b", 2)]))
    );

    let transport = harness.shutdown().await;
    assert_eq!(transport.committed(), Some(state(&[("a", 1), ("b", 2)])));
}

#[tokio::test(start_paused = true)]
async fn test_replace_discards_previous_fields() {
    let harness = TestHarness::new();

    harness.handle.set_state(state(&[("a", 1), ("b", 1)])).unwrap();
    sleep(Duration::from_millis(100)).await;

    harness.handle.set_state(state(&[("c", 3)])).unwrap();

    let transport = harness.shutdown().await;
    assert_eq!(transport.committed(), Some(state(&[("c", 3)])));
}

#[tokio::test(start_paused = true)]
async fn test_remote_state_reads_from_transport() {
    let harness = TestHarness::new();
    exhaust_burst(&harness).await;

    harness.handle.set_state_field("x", 1).unwrap();
    assert_eq!(harness.handle.get_state(Some(9)).await.unwrap(), None);

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_directed_and_broadcast_do_not_merge() {
    let harness = TestHarness::new();

    harness
        .handle
        .submit_message(Some(4), Bytes::from("to-four"))
        .unwrap();
    harness
        .handle
        .broadcast_message(Bytes::from("to-all"))
        .unwrap();

    let calls = harness.shutdown().await.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&Call::Directed {
        device: 4,
        payload: Bytes::from("to-four")
    }));
    assert!(calls.contains(&Call::Broadcast {
        payload: Bytes::from("to-all")
    }));
}
