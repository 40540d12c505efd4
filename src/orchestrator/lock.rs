//! In-process advisory locks keyed by function name.
//!
//! Serializes checkpoint and rollback pipelines that target the same function
//! within one process. Different functions never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::FunctionName;

type LockMap = HashMap<FunctionName, Arc<AsyncMutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct FunctionLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Exclusive access to one function. The map entry is dropped with the last holder.
#[derive(Debug)]
pub struct FunctionLockGuard {
    function: FunctionName,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl FunctionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `function`. Released when the guard drops.
    pub async fn acquire(&self, function: &FunctionName) -> FunctionLockGuard {
        let lock = {
            let mut locks = lock_map(&self.locks);
            locks
                .entry(function.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        if lock.try_lock().is_err() {
            log::info!("[Lock] Waiting for in-flight operation on {}", function);
        }

        FunctionLockGuard {
            function: function.clone(),
            locks: Arc::clone(&self.locks),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of functions currently locked or waited on.
    pub fn tracked(&self) -> usize {
        lock_map(&self.locks).len()
    }
}

impl Drop for FunctionLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Entries are only cloned under the map lock, so a count of one means
        // nobody else holds or awaits this function.
        let mut locks = lock_map(&self.locks);
        if locks
            .get(&self.function)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.function);
        }
    }
}

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
