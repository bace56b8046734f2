use std::{
    fs::File,
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
use log::{debug, trace};
use thiserror::Error;

/// Exclusive advisory lock held for as long as the value lives.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Error, Debug)]
#[error("Could not lock {}", .path.display())]
pub struct LockError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FileLock {
    /// Blocks until the lock on `path` is acquired, creating the file if needed.
    pub fn new(path: &Path) -> Result<Self, LockError> {
        let to_error = |source| LockError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_error)?;
        debug!("Acquiring a lock on {}", path.display());
        FileExt::lock_exclusive(&file).map_err(to_error)?;
        trace!("Acquired a lock on {}", path.display());
        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        trace!("Releasing the lock on {}", self.path.display());
    }
}
