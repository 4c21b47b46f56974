//! Exclusive lock on the archive directory
//!
//! An advisory `flock` on `<archive_dir>/lock`. The lock is held for as
//! long as the guard lives and released when it is dropped, so every exit
//! path of a transaction gives it back.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use pkgjob_errors::{Error, StoreError};

#[derive(Debug)]
pub struct ArchiveLock {
    file: File,
    path: PathBuf,
}

impl ArchiveLock {
    /// Try to take the lock without blocking
    ///
    /// Creates the archive and partial directories when missing. Returns
    /// `Ok(None)` when another process holds the lock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockFailed` when the directories or the lock file
    /// cannot be created, or locking fails for a reason other than
    /// contention.
    pub fn try_acquire(archive_dir: &Path) -> Result<Option<Self>, Error> {
        let path = archive_dir.join("lock");

        fs::create_dir_all(archive_dir.join("partial")).map_err(|e| lock_failed(&path, &e))?;

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| lock_failed(&path, &e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "acquired archive lock");
                Ok(Some(Self { file, path }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!(path = %path.display(), "archive lock held elsewhere");
                Ok(None)
            }
            Err(e) => Err(lock_failed(&path, &e).into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_failed(path: &Path, err: &std::io::Error) -> StoreError {
    StoreError::LockFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), %err, "failed to release archive lock");
        }
    }
}
