//! 测试辅助工具模块
//! Test utilities module

#![cfg(test)]

use crate::channel::StateMap;
use crate::clock::{Clock, ManualClock};
use crate::sender::DownstreamSender;
use std::collections::HashMap;
use tokio::time::Instant;

/// A downstream call observed by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Directed { recipient: u32, payload: String },
    Broadcast { payload: String },
    Commit(StateMap<i64>),
}

/// A sender that records every call together with the instant it happened
/// and keeps the committed state like a real transport would.
#[derive(Debug)]
pub struct RecordingSender {
    clock: ManualClock,
    pub deliveries: Vec<(Instant, Delivery)>,
    pub committed: Option<StateMap<i64>>,
    pub remote: HashMap<u32, StateMap<i64>>,
    pub local_id: Option<u32>,
}

impl RecordingSender {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            deliveries: Vec::new(),
            committed: None,
            remote: HashMap::new(),
            local_id: None,
        }
    }

    pub fn with_local_id(mut self, id: u32) -> Self {
        self.local_id = Some(id);
        self
    }

    /// Deliveries without their instants.
    pub fn calls(&self) -> Vec<Delivery> {
        self.deliveries.iter().map(|(_, d)| d.clone()).collect()
    }

    /// Instants of every delivery, in order.
    pub fn instants(&self) -> Vec<Instant> {
        self.deliveries.iter().map(|(at, _)| *at).collect()
    }

    fn record(&mut self, delivery: Delivery) {
        self.deliveries.push((self.clock.now(), delivery));
    }
}

impl DownstreamSender for RecordingSender {
    type Recipient = u32;
    type Message = String;
    type Value = i64;

    fn send_directed(&mut self, recipient: u32, payload: String) {
        self.record(Delivery::Directed { recipient, payload });
    }

    fn send_broadcast(&mut self, payload: String) {
        self.record(Delivery::Broadcast { payload });
    }

    fn commit_state_replace(&mut self, state: StateMap<i64>) {
        self.committed = Some(state.clone());
        self.record(Delivery::Commit(state));
    }

    fn committed_state(&self, recipient: Option<&u32>) -> Option<StateMap<i64>> {
        match recipient {
            Some(id) if Some(*id) != self.local_id => self.remote.get(id).cloned(),
            _ => self.committed.clone(),
        }
    }

    fn local_recipient(&self) -> Option<u32> {
        self.local_id
    }
}

/// Builds a state map from literal pairs.
pub fn state(fields: &[(&str, i64)]) -> StateMap<i64> {
    fields
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}
