use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs4::FileExt;

use crate::error::{FleetError, Result};
use crate::models::PlatformLayout;

/// An exclusive advisory lock on a file. Released when dropped or when the
/// holding process exits.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock is acquired. Waiting happens on the blocking pool.
    pub async fn acquire(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(&path))
            .await
            .map_err(|e| FleetError::Lock {
                path: PathBuf::new(),
                source: std::io::Error::other(e.to_string()),
            })?
    }

    pub fn acquire_blocking(path: &Path) -> Result<Self> {
        let file = open_lock_file(path)?;
        if file.try_lock_exclusive().is_err() {
            tracing::info!(path = %path.display(), "waiting_for_lock");
            file.lock_exclusive().map_err(|e| lock_error(path, e))?;
        }
        Ok(Self::stamped(file, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the lock file, then release. Used once the tenant is gone.
    pub fn release_and_remove(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "lock_file_remove_failed");
            }
        }
    }

    fn stamped(mut file: File, path: &Path) -> Self {
        // Owner pid for diagnostics only.
        let _ = file.set_len(0);
        let _ = writeln!(file, "{}", std::process::id());
        tracing::debug!(path = %path.display(), "lock_acquired");
        Self {
            file,
            path: path.to_path_buf(),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "lock_released");
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| lock_error(path, e))?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| lock_error(path, e))
}

fn lock_error(path: &Path, source: std::io::Error) -> FleetError {
    FleetError::Lock {
        path: path.to_path_buf(),
        source,
    }
}

/// Locks held for one lifecycle operation, acquired in id order so two
/// operations touching the same pair of sites cannot deadlock.
#[derive(Debug)]
pub struct SiteLocks {
    locks: Vec<(String, FileLock)>,
}

impl SiteLocks {
    pub async fn acquire(layout: &PlatformLayout, ids: &[&str]) -> Result<Self> {
        let mut ordered: Vec<&str> = ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        let mut locks = Vec::with_capacity(ordered.len());
        for id in ordered {
            let lock = FileLock::acquire(&layout.site_lock(id)).await?;
            locks.push((id.to_string(), lock));
        }
        Ok(Self { locks })
    }

    /// Release everything, deleting the lock files of the given ids.
    pub fn release_removing(self, remove: &[&str]) {
        for (id, lock) in self.locks {
            if remove.contains(&id.as_str()) {
                lock.release_and_remove();
            }
        }
    }
}
