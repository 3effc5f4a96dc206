//! Memory image session cache.
//!
//! Lifecycle: a handle is opened on the first request naming an image path
//! and kept until the process exits (or [`SessionCache::reset`] is called).
//! Cached handles are served under a read lock; first-time opens take a
//! per-path mutex so concurrent requests for the same new path open it once.

use crate::backend::{Backend, ImageHandle};
use crate::query::error::{QueryError, QueryResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SessionCache {
    backend: Arc<dyn Backend>,
    handles: RwLock<HashMap<String, Arc<dyn ImageHandle>>>,
    /// One open lock per path that has been requested.
    open_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionCache {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        SessionCache {
            backend,
            handles: RwLock::new(HashMap::new()),
            open_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the handle for `path`, opening it on first use.
    ///
    /// Paths are compared as exact strings. Failed opens are not cached.
    pub fn acquire(&self, path: &str) -> QueryResult<Arc<dyn ImageHandle>> {
        if path.is_empty() {
            return Err(QueryError::OpenFailure {
                path: String::new(),
                reason: "image path is empty".to_string(),
            });
        }

        if let Some(handle) = self.handles.read().get(path) {
            return Ok(handle.clone());
        }

        let open_lock = self
            .open_locks
            .lock()
            .entry(path.to_string())
            .or_default()
            .clone();
        let _guard = open_lock.lock();

        // Another request may have finished opening while we waited.
        if let Some(handle) = self.handles.read().get(path) {
            debug!("session: {} opened by a concurrent request", path);
            return Ok(handle.clone());
        }

        let handle = match self.backend.open(path) {
            Ok(handle) => handle,
            Err(e) => {
                self.forget_open_lock(path, &open_lock);
                return Err(e.into());
            }
        };
        let handle = self
            .handles
            .write()
            .entry(path.to_string())
            .or_insert(handle)
            .clone();
        info!("session: opened memory image {}", path);
        Ok(handle)
    }

    /// Drop the open lock of a path whose open failed, unless it was replaced.
    fn forget_open_lock(&self, path: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.open_locks.lock();
        if locks.get(path).is_some_and(|l| Arc::ptr_eq(l, lock)) {
            locks.remove(path);
        }
    }

    #[allow(dead_code)]
    pub fn is_cached(&self, path: &str) -> bool {
        self.handles.read().contains_key(path)
    }

    /// Number of cached handles.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached handle.
    #[allow(dead_code)]
    pub fn reset(&self) {
        let dropped = {
            let mut handles = self.handles.write();
            let n = handles.len();
            handles.clear();
            n
        };
        self.open_locks.lock().clear();
        info!("session: reset, dropped {} handles", dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::error::ErrorKind;
    use crate::testing::CountingBackend;
    use std::time::Duration;

    #[test]
    fn test_first_acquire_opens_once_then_reuses() {
        let backend = Arc::new(CountingBackend::new(&["/cases/a.snap.json"]));
        let cache = SessionCache::new(backend.clone());

        let first = cache.acquire("/cases/a.snap.json").unwrap();
        assert_eq!(backend.opens(), 1);
        assert_eq!(cache.len(), 1);

        let second = cache.acquire("/cases/a.snap.json").unwrap();
        assert_eq!(backend.opens(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_distinct_paths_get_distinct_handles() {
        let backend = Arc::new(CountingBackend::new(&["/cases/a.snap.json", "/cases/b.snap.json"]));
        let cache = SessionCache::new(backend.clone());

        cache.acquire("/cases/a.snap.json").unwrap();
        cache.acquire("/cases/b.snap.json").unwrap();
        assert_eq!(backend.opens(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_open_failure_propagates_and_is_not_cached() {
        let backend = Arc::new(CountingBackend::new(&[]));
        let cache = SessionCache::new(backend.clone());

        let err = cache.acquire("/cases/missing.raw").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::OpenFailure);
        assert!(!cache.is_cached("/cases/missing.raw"));

        // Retried on the next call.
        let _ = cache.acquire("/cases/missing.raw");
        assert_eq!(backend.opens(), 2);
    }

    #[test]
    fn test_open_failure_leaves_no_open_lock() {
        let backend = Arc::new(CountingBackend::new(&["/cases/a.snap.json"]));
        let cache = SessionCache::new(backend);

        for i in 0..16 {
            let _ = cache.acquire(&format!("/cases/missing-{}.raw", i));
        }
        assert!(cache.open_locks.lock().is_empty());

        cache.acquire("/cases/a.snap.json").unwrap();
        assert_eq!(cache.open_locks.lock().len(), 1);
    }

    #[test]
    fn test_empty_path_rejected_without_backend_call() {
        let backend = Arc::new(CountingBackend::new(&[""]));
        let cache = SessionCache::new(backend.clone());

        let err = cache.acquire("").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::OpenFailure);
        assert_eq!(backend.opens(), 0);
    }

    #[test]
    fn test_reset_forces_reopen() {
        let backend = Arc::new(CountingBackend::new(&["/cases/a.snap.json"]));
        let cache = SessionCache::new(backend.clone());

        cache.acquire("/cases/a.snap.json").unwrap();
        cache.reset();
        assert!(cache.is_empty());
        cache.acquire("/cases/a.snap.json").unwrap();
        assert_eq!(backend.opens(), 2);
    }

    #[test]
    fn test_concurrent_first_open_is_serialized() {
        let backend = Arc::new(
            CountingBackend::new(&["/cases/a.snap.json", "/cases/b.snap.json"])
                .with_delay(Duration::from_millis(50)),
        );
        let cache = Arc::new(SessionCache::new(backend.clone()));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let path = if i % 2 == 0 { "/cases/a.snap.json" } else { "/cases/b.snap.json" };
                    cache.acquire(path).map(|_| ())
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap().unwrap();
        }

        assert_eq!(backend.opens_of("/cases/a.snap.json"), 1);
        assert_eq!(backend.opens_of("/cases/b.snap.json"), 1);
        assert_eq!(cache.len(), 2);
    }
}
