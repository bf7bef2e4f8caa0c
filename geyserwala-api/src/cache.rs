//! Last-known device values with a freshness window

use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::time::Instant;

/// In-memory copy of the values the device last reported
///
/// Lookups never do I/O. The cache only knows when it was last refreshed;
/// deciding to go to the network is the client's job.
#[derive(Debug)]
pub struct StateCache {
    values: RwLock<Map<String, Value>>,
    last_update: RwLock<Option<Instant>>,
    ttl: Duration,
}

impl StateCache {
    /// Create a new empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            values: RwLock::new(Map::new()),
            last_update: RwLock::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True while the last refresh is younger than the TTL
    pub fn is_fresh(&self) -> bool {
        match *self.last_update.read() {
            Some(at) => at.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Stamp a completed refresh that started at `at`
    pub fn mark_updated(&self, at: Instant) {
        *self.last_update.write() = Some(at);
    }

    /// Overwrite the given keys, leaving every other key untouched
    pub fn merge(&self, update: Map<String, Value>) {
        let mut values = self.values.write();
        for (key, value) in update {
            values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// String value, or `default` when absent or not a string
    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.values
            .read()
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// Integer value; floats are rounded to the nearest integer
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.read().get(key).and_then(as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.read().get(key).and_then(Value::as_f64)
    }

    /// Boolean value; integers count as `value != 0`
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().get(key).and_then(as_bool)
    }

    /// Look up `name` inside the object stored under `key`
    pub fn get_nested_bool(&self, key: &str, name: &str) -> Option<bool> {
        self.values
            .read()
            .get(key)
            .and_then(Value::as_object)
            .and_then(|map| map.get(name))
            .and_then(as_bool)
    }

    /// Snapshot of every cached value
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }
}

pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

pub(crate) fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}
