//! Subscribe frames kept for replay after a reconnect.

use crate::error::{Error, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

/// Subscribe frames keyed by subscription hash, capped in number.
#[derive(Debug)]
pub struct SubscriptionManager {
    frames: DashMap<String, Value>,
    max_subscriptions: usize,
}

impl SubscriptionManager {
    /// Manager holding at most `max_subscriptions` entries.
    pub fn new(max_subscriptions: usize) -> Self {
        Self {
            frames: DashMap::new(),
            max_subscriptions,
        }
    }

    /// Stores `frame` under `key`. Returns `false` when the key was
    /// already present, in which case the frame is not replaced.
    pub fn try_add(&self, key: &str, frame: Value) -> Result<bool> {
        if self.frames.contains_key(key) {
            return Ok(false);
        }
        if self.frames.len() >= self.max_subscriptions {
            return Err(Error::invalid_request(format!(
                "Maximum subscriptions ({}) reached",
                self.max_subscriptions
            )));
        }
        match self.frames.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(frame);
                Ok(true)
            }
        }
    }

    /// Forgets `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.frames.remove(key).map(|(_, frame)| frame)
    }

    /// Whether `key` is stored.
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.frames.contains_key(key)
    }

    /// Stored entry count.
    #[inline]
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    /// All frames, for replay.
    pub fn collect_frames(&self) -> Vec<Value> {
        self.frames.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Forgets everything.
    pub fn clear(&self) {
        self.frames.clear();
    }
}
