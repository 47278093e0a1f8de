//! One-shot waiters keyed by message hash.
//!
//! A watch call registers interest in a hash (`ticker:BTC/USDT`) and
//! receives the next value published under it. Every waiter on a hash is
//! woken by a single `resolve`; later waiters wait for the next one.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Waiters<T> = HashMap<String, Vec<oneshot::Sender<Result<T>>>>;

/// Pending futures for values of type `T`.
#[derive(Debug)]
pub struct MessageHub<T> {
    waiters: Mutex<Waiters<T>>,
}

impl<T> Default for MessageHub<T> {
    fn default() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> MessageHub<T> {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn waiters(&self) -> MutexGuard<'_, Waiters<T>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a waiter on `hash`. Waiters whose receiver was dropped
    /// are pruned first.
    pub fn future(&self, hash: impl Into<String>) -> oneshot::Receiver<Result<T>> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters();
        waiters.retain(|_, senders| {
            senders.retain(|tx| !tx.is_closed());
            !senders.is_empty()
        });
        waiters.entry(hash.into()).or_default().push(tx);
        rx
    }

    /// Wakes every waiter on `hash` with `value`. Returns how many were
    /// still listening.
    pub fn resolve(&self, hash: &str, value: &T) -> usize {
        let Some(senders) = self.waiters().remove(hash) else {
            return 0;
        };
        senders
            .into_iter()
            .map(|tx| tx.send(Ok(value.clone())).is_ok())
            .filter(|sent| *sent)
            .count()
    }

    /// Wakes every waiter on `hash` with an error from `make_err`.
    pub fn reject(&self, hash: &str, make_err: impl Fn() -> Error) -> usize {
        let Some(senders) = self.waiters().remove(hash) else {
            return 0;
        };
        senders
            .into_iter()
            .map(|tx| tx.send(Err(make_err())).is_ok())
            .filter(|sent| *sent)
            .count()
    }

    /// Rejects every waiter on every hash.
    pub fn reject_all(&self, make_err: impl Fn() -> Error) {
        let drained: Vec<_> = self.waiters().drain().collect();
        for (_, senders) in drained {
            for tx in senders {
                let _ = tx.send(Err(make_err()));
            }
        }
    }

    /// Hashes with waiters that start with `prefix`.
    pub fn find_hashes(&self, prefix: &str) -> Vec<String> {
        self.waiters()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Whether anyone waits on `hash`.
    pub fn has_waiters(&self, hash: &str) -> bool {
        self.waiters()
            .get(hash)
            .is_some_and(|senders| senders.iter().any(|tx| !tx.is_closed()))
    }
}

/// Awaits a hub receiver, mapping a dropped sender to a cancellation.
pub async fn wait<T>(rx: oneshot::Receiver<Result<T>>) -> Result<T> {
    rx.await
        .unwrap_or_else(|_| Err(Error::cancelled("connection closed before update")))
}
