use crate::consts::{LOCK_FILE_SUFFIX, LOCK_POLL_INTERVAL_MS};
use crate::exceptions::BenchError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Exclusive advisory lock guarding one store file. Unlocks on drop.
///
/// The lock file itself is left in place: removing it would let a waiter lock
/// an unlinked inode while a newcomer locks a fresh one.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// `dev/bench/data.js` is guarded by `dev/bench/data.js.lock`.
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(LOCK_FILE_SUFFIX);
        store_path.with_file_name(name)
    }

    /// Polls for the lock until `timeout` elapses.
    pub fn acquire(store_path: &Path, timeout: Duration) -> Result<Self, BenchError> {
        let path = Self::lock_path(store_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let start = Instant::now();
        let mut reported_wait = false;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!(
                        lock = %path.display(),
                        waited_ms = start.elapsed().as_millis() as u64,
                        "store lock acquired"
                    );
                    return Ok(Self { file, path });
                }
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(e.into()),
            }

            if start.elapsed() >= timeout {
                return Err(BenchError::LockTimeout(format!(
                    "Timed out acquiring {} after {:.2}s; another writer is still running",
                    path.display(),
                    start.elapsed().as_secs_f64()
                )));
            }

            if !reported_wait {
                info!(lock = %path.display(), "waiting for another writer to release the store");
                reported_wait = true;
            }

            std::thread::sleep(Duration::from_millis(LOCK_POLL_INTERVAL_MS));
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
        || e.kind() == std::io::ErrorKind::WouldBlock
}
