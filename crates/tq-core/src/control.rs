//! Handles shared between the active job's descriptor and the job slot.
//!
//! The scheduler installs a fresh `CancelToken` and `ProgressHandle` on every
//! job it starts and keeps clones in the job slot. `cancel_one` / `cancel_all`
//! flip the flag while the downloader still owns the descriptor; the
//! downloader polls it at track boundaries and stops on its own. Counters
//! flow the other way: the descriptor publishes them as tracks finish and
//! snapshots read the latest copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::object::Outcome;

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the job stop at its next checkpoint.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latest counters of a running job. Clones observe the same counters.
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle(Arc<Mutex<Outcome>>);

impl ProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, outcome: &Outcome) {
        *self.lock() = outcome.clone();
    }

    pub fn latest(&self) -> Outcome {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Outcome> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
