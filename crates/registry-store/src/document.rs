//! The shared annotated configuration document.
//!
//! Reads are async and timeout-bounded; a missing document reads as
//! `None` so callers can degrade to an empty listing. Mutation goes
//! through [`DocumentStore::lock_exclusive`] plus the blocking read/write
//! pair, run off the async path (`spawn_blocking`), so the whole
//! read-modify-write cycle happens under one advisory lock.
//!
//! The lock lives on a sidecar `.lock` file rather than the document
//! itself: the document inode is replaced on every rewrite (temp +
//! rename), which would silently drop a lock held on it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tokio::fs;
use tokio::time::timeout;

use crate::error::StoreError;
use crate::quota::tmp_path;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Handle on the annotated document file.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
    lock_path: PathBuf,
    io_timeout: Duration,
    lock_timeout: Duration,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>, io_timeout: Duration, lock_timeout: Duration) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        DocumentStore {
            path,
            lock_path,
            io_timeout,
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document text. `Ok(None)` when the document does
    /// not exist.
    pub async fn read(&self) -> Result<Option<String>, StoreError> {
        let read = timeout(self.io_timeout, fs::read_to_string(&self.path))
            .await
            .map_err(|_| StoreError::Timeout {
                op: "document read",
                timeout: self.io_timeout,
            })?;
        match read {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Acquire the exclusive advisory lock, polling until the lock
    /// deadline. Blocking; call from `spawn_blocking`.
    ///
    /// The lock is released when the returned guard drops, on every exit
    /// path.
    pub fn lock_exclusive(&self) -> Result<DocumentLock, StoreError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(DocumentLock { file }),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::LockTimeout {
                            timeout: self.lock_timeout,
                        });
                    }
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
    }

    /// Blocking read for use while holding the lock.
    pub fn read_blocking(&self, _lock: &DocumentLock) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Blocking atomic rewrite (temp + rename) for use while holding the
    /// lock. Readers never observe a truncated document.
    pub fn write_blocking(&self, _lock: &DocumentLock, text: &str) -> Result<(), StoreError> {
        let tmp = tmp_path(&self.path);
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// RAII guard for the document's advisory lock.
#[derive(Debug)]
pub struct DocumentLock {
    file: std::fs::File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir, lock_timeout: Duration) -> DocumentStore {
        DocumentStore::new(
            dir.path().join("config.json"),
            Duration::from_secs(5),
            lock_timeout,
        )
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Duration::from_secs(1));
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn locked_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Duration::from_secs(1));
        let lock = store.lock_exclusive().unwrap();
        assert!(store.read_blocking(&lock).unwrap().is_none());
        store.write_blocking(&lock, "#vmess\n{}\n").unwrap();
        drop(lock);
        assert_eq!(store.read().await.unwrap().unwrap(), "#vmess\n{}\n");
    }

    #[test]
    fn contended_lock_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let holder = store(&dir, Duration::from_secs(1));
        let _held = holder.lock_exclusive().unwrap();

        let waiter = store(&dir, Duration::from_millis(100));
        let err = waiter.lock_exclusive().unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { .. }));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Duration::from_millis(200));
        drop(store.lock_exclusive().unwrap());
        // Immediately acquirable again.
        store.lock_exclusive().unwrap();
    }

    #[tokio::test]
    async fn rewrite_replaces_content_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Duration::from_secs(1));
        let lock = store.lock_exclusive().unwrap();
        store.write_blocking(&lock, "first").unwrap();
        store.write_blocking(&lock, "second").unwrap();
        drop(lock);
        assert_eq!(store.read().await.unwrap().unwrap(), "second");
        // No stray temp files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }
}
