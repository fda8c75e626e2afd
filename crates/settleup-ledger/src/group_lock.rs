//! Per-group settlement lock.
//!
//! At most one settlement run per group may be between "read unsettled rows"
//! and "replace unsettled rows" at any time. Runs on different groups never
//! contend. The store's version compare-and-swap is the second line: it
//! catches writers outside this process that never saw these locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use settleup_types::{GroupId, Result, SettleupError};
use tokio::sync::OwnedMutexGuard;

/// Registry of one async mutex per group.
#[derive(Debug, Default)]
pub struct GroupLocks {
    locks: Mutex<HashMap<GroupId, Arc<tokio::sync::Mutex<()>>>>,
}

/// Proof that the holder is the only active settlement run for `group`.
/// Released on drop.
#[derive(Debug)]
pub struct GroupGuard {
    group: GroupId,
    _guard: OwnedMutexGuard<()>,
}

impl GroupGuard {
    #[must_use]
    pub fn group(&self) -> &GroupId {
        &self.group
    }
}

impl GroupLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for exclusive access to `group`.
    ///
    /// # Errors
    /// Returns [`SettleupError::LockTimeout`] if another run still holds the
    /// group when the timeout elapses.
    pub async fn acquire(&self, group: &GroupId, timeout: Duration) -> Result<GroupGuard> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(group.clone()).or_default())
        };

        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(GroupGuard {
                group: group.clone(),
                _guard: guard,
            }),
            Err(_) => {
                tracing::warn!(
                    group = %group,
                    timeout_ms = timeout.as_millis(),
                    "Settlement lock wait timed out"
                );
                Err(SettleupError::LockTimeout {
                    group: group.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Drop `group`'s entry if nobody holds or waits on it.
    ///
    /// Callers release after their guard is dropped so the registry only
    /// tracks groups with a run in flight.
    pub fn release_if_idle(&self, group: &GroupId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(group)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(group);
        }
    }

    /// Number of groups currently tracked.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no group is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
