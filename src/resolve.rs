//! Module resolution layer: synchronous lookup plus asynchronous
//! "wait until a matching module appears".
//!
//! Waits are event-driven, never polled: a pending wait parks on a oneshot
//! channel that [`Resolver::register`] fulfills the moment a satisfying module
//! registers. Fulfillment order for waits satisfied by the same registration
//! is wait-registration order. Dropping a wait future cancels it and removes
//! the listener synchronously.

use crate::host::ModuleId;
use crate::index::ModuleIndex;
use crate::predicate::CapabilityPredicate;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

/// Options for a pending wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitOptions {
    /// Fail the wait with [`ResolveError::Timeout`] after this long. `None`
    /// waits indefinitely.
    pub timeout: Option<Duration>,
}

impl WaitOptions {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    /// No matching module appeared before the deadline. Recoverable: the
    /// module may simply not exist in this host version.
    #[error("no matching module registered within {0:?}")]
    Timeout(Duration),

    /// The wait's channel closed without fulfillment.
    #[error("wait was cancelled before a matching module appeared")]
    Cancelled,
}

enum WaitMode {
    One(Option<oneshot::Sender<Arc<Value>>>),
    Many {
        want: usize,
        got: Vec<Arc<Value>>,
        tx: Option<oneshot::Sender<Vec<Arc<Value>>>>,
    },
}

struct PendingWait {
    id: u64,
    predicate: CapabilityPredicate,
    mode: WaitMode,
}

impl PendingWait {
    fn fulfilled(&self) -> bool {
        match &self.mode {
            WaitMode::One(tx) => tx.is_none(),
            WaitMode::Many { tx, .. } => tx.is_none(),
        }
    }
}

#[derive(Default)]
struct WaitTable {
    next_id: u64,
    entries: Vec<PendingWait>,
}

/// Serves capability lookups and waits over the module index.
///
/// `register` is the single mutation entry: it indexes the exports and
/// fulfills pending waits under one lock, so a wait can never miss a
/// registration that races its own enqueue.
pub struct Resolver {
    index: Arc<ModuleIndex>,
    waits: Mutex<WaitTable>,
}

impl Resolver {
    pub fn new(index: Arc<ModuleIndex>) -> Self {
        Self {
            index,
            waits: Mutex::new(WaitTable::default()),
        }
    }

    pub fn index(&self) -> &Arc<ModuleIndex> {
        &self.index
    }

    /// Index a module's exports and fulfill every pending wait it satisfies,
    /// in wait-registration order.
    pub fn register(&self, id: ModuleId, exports: Value) -> Arc<Value> {
        let mut table = self.waits.lock().expect("wait table lock poisoned");
        let handle = self.index.insert(id, exports);

        for wait in table.entries.iter_mut() {
            if !(wait.predicate)(&handle) {
                continue;
            }
            match &mut wait.mode {
                WaitMode::One(tx) => {
                    if let Some(tx) = tx.take() {
                        // A closed receiver just means the waiter is gone.
                        let _ = tx.send(Arc::clone(&handle));
                    }
                }
                WaitMode::Many { want, got, tx } => {
                    got.push(Arc::clone(&handle));
                    if got.len() >= *want {
                        if let Some(tx) = tx.take() {
                            let _ = tx.send(std::mem::take(got));
                        }
                    }
                }
            }
        }
        table.entries.retain(|wait| !wait.fulfilled());

        handle
    }

    /// First registered module satisfying the predicate, right now.
    pub fn find_now(&self, predicate: &CapabilityPredicate) -> Option<Arc<Value>> {
        self.index.lookup(predicate.as_ref())
    }

    /// Every currently registered match, in registration order.
    pub fn find_all_now(&self, predicate: &CapabilityPredicate) -> Vec<Arc<Value>> {
        self.index.lookup_all(predicate.as_ref())
    }

    /// Resolve to the first module satisfying the predicate: immediately if
    /// one is already registered, otherwise as soon as one appears.
    pub async fn wait_for(
        &self,
        predicate: CapabilityPredicate,
        options: WaitOptions,
    ) -> Result<Arc<Value>, ResolveError> {
        let (id, rx) = {
            let mut table = self.waits.lock().expect("wait table lock poisoned");
            if let Some(hit) = self.index.lookup(predicate.as_ref()) {
                return Ok(hit);
            }
            let (tx, rx) = oneshot::channel();
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push(PendingWait {
                id,
                predicate,
                mode: WaitMode::One(Some(tx)),
            });
            debug!(wait = id, pending = table.entries.len(), "wait suspended");
            (id, rx)
        };
        let _guard = WaitGuard { resolver: self, id };
        self.await_receiver(rx, options).await
    }

    /// Resolve once `count` matches have accumulated. Modules already
    /// registered at call time count toward `count`; only the remainder is
    /// awaited.
    pub async fn wait_for_all(
        &self,
        predicate: CapabilityPredicate,
        count: usize,
        options: WaitOptions,
    ) -> Result<Vec<Arc<Value>>, ResolveError> {
        let (id, rx) = {
            let mut table = self.waits.lock().expect("wait table lock poisoned");
            let existing = self.index.lookup_all(predicate.as_ref());
            if existing.len() >= count {
                return Ok(existing);
            }
            let (tx, rx) = oneshot::channel();
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push(PendingWait {
                id,
                predicate,
                mode: WaitMode::Many {
                    want: count,
                    got: existing,
                    tx: Some(tx),
                },
            });
            debug!(wait = id, pending = table.entries.len(), "wait suspended");
            (id, rx)
        };
        let _guard = WaitGuard { resolver: self, id };
        self.await_receiver(rx, options).await
    }

    async fn await_receiver<T>(
        &self,
        rx: oneshot::Receiver<T>,
        options: WaitOptions,
    ) -> Result<T, ResolveError> {
        match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(_)) => Err(ResolveError::Cancelled),
                Err(_) => Err(ResolveError::Timeout(limit)),
            },
            None => rx.await.map_err(|_| ResolveError::Cancelled),
        }
    }

    fn remove_wait(&self, id: u64) {
        let mut table = self.waits.lock().expect("wait table lock poisoned");
        table.entries.retain(|wait| wait.id != id);
    }

    /// Number of waits still pending (diagnostics and tests).
    pub fn pending_waits(&self) -> usize {
        self.waits
            .lock()
            .expect("wait table lock poisoned")
            .entries
            .len()
    }
}

/// Removes the pending entry when the owning wait future is dropped, whether
/// by fulfillment, timeout, or caller-side cancellation.
struct WaitGuard<'a> {
    resolver: &'a Resolver,
    id: u64,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.resolver.remove_wait(self.id);
    }
}
