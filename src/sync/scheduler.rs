//! Work admission and write serialization for page transforms
//!
//! This module handles:
//! - A bounded pool admitting at most `concurrency` transforms at once
//! - One async mutex per output path, held across index read-merge-write

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};

/// Bounded worker pool for page transforms
#[derive(Debug, Clone)]
pub struct WorkQueue {
    semaphore: Arc<Semaphore>,
    width: usize,
}

impl WorkQueue {
    /// Creates a queue admitting `width` jobs at once (at least one)
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of jobs that could be admitted right now
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot
    ///
    /// The slot is released when the returned permit is dropped. Returns
    /// `None` only if the queue was closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }
}

/// Hands out one async mutex per path
///
/// Holders of the same path run one after another; different paths do not
/// contend. Paths are compared component-wise, so `a/b`, `./a/b` and `a/b/`
/// share a lock.
#[derive(Debug, Default)]
pub struct DirLocks {
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl DirLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks `path` until the returned guard is dropped
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let key: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Number of distinct paths seen so far
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
