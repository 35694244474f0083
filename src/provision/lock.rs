//! A registry of named mutexes so that provisioning two requests for the
//! *same* `(lang, resource_type)` key serializes, while distinct keys run
//! fully in parallel ("Provision for the same triple is serialized
//! by a per-key exclusive lock").

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lock for `key`, blocking if another thread
    /// currently holds it. The returned guard's lifetime is detached from
    /// `self` via an `Arc`, so it can outlive the registry lookup.
    pub fn acquire(&self, key: &str) -> LockHandle {
        let arc = {
            let mut locks = self.locks.lock().unwrap();
            locks.entry(key.to_string()).or_default().clone()
        };
        LockHandle { arc }
    }
}

/// An owned handle to a held per-key lock. Dropping it releases the lock.
pub struct LockHandle {
    arc: Arc<Mutex<()>>,
}

impl LockHandle {
    pub fn guard(&self) -> MutexGuard<'_, ()> {
        self.arc.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[test]
    fn same_key_serializes() {
        let registry = Arc::new(LockRegistry::new());
        let counter = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                let lock = registry.acquire("en_ulb");
                let _guard = lock.guard();
                let before = counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(before, 0, "overlapping critical section");
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
