//! Named counters for the agent-execution pipeline.
//!
//! A [`CounterRegistry`] is an injectable value, not module state: the
//! runner takes one by `Arc`, and tests instantiate isolated registries
//! instead of mutating anything process-wide.

#![deny(missing_docs)]

use std::collections::HashMap;
use std::sync::Mutex;

/// A registry of named, incrementable counters.
///
/// Counters are created on first increment and implicitly read as zero
/// before that. Steps may be negative; these are plain accumulators, no
/// validation. Snapshot reads return an independent copy, so callers
/// cannot mutate internal state through the returned map.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: Mutex<HashMap<String, i64>>,
}

impl CounterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add 1 to the named counter.
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Add `value` to the named counter, initializing at 0 if absent.
    pub fn increment_by(&self, name: &str, value: i64) {
        let mut counters = self.lock();
        *counters.entry(name.to_owned()).or_insert(0) += value;
    }

    /// Read one counter. Untouched counters read as zero.
    pub fn get(&self, name: &str) -> i64 {
        self.lock().get(name).copied().unwrap_or(0)
    }

    /// A shallow copy of all counters. Mutating the returned map does not
    /// affect the registry.
    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, i64>> {
        self.counters.lock().expect("counter lock poisoned")
    }
}
