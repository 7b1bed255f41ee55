use crate::types::LogEvent;
use std::collections::{HashMap, HashSet};

/// Ascending by timestamp; ties keep their collection order.
pub fn sort_events(mut events: Vec<LogEvent>) -> Vec<LogEvent> {
    events.sort_by_key(|e| e.timestamp);
    events
}

/// True unless some reference event has the same timestamp and message.
pub fn is_new(event: &LogEvent, reference: &[LogEvent]) -> bool {
    !reference
        .iter()
        .any(|seen| seen.timestamp == event.timestamp && seen.message == event.message)
}

/// Identities of every event emitted during one follow run.
#[derive(Debug, Default)]
pub struct SeenSet {
    by_timestamp: HashMap<i64, HashSet<String>>,
    len: usize,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &LogEvent) -> bool {
        self.by_timestamp
            .get(&event.timestamp)
            .is_some_and(|messages| messages.contains(&event.message))
    }

    /// Records the event, returning whether it had not been seen before.
    pub fn insert(&mut self, event: &LogEvent) -> bool {
        if self.contains(event) {
            return false;
        }
        self.by_timestamp
            .entry(event.timestamp)
            .or_default()
            .insert(event.message.clone());
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
