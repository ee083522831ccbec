//! Lifecycle marker file.

use crate::error::Result;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Identity of one marker file on disk.
///
/// Two files at the same path compare unequal when one was deleted and the
/// other created in its place, even if that happened between two checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    // Inode numbers can be reused right away; the birth time tells a
    // recreated file apart from the original. Writes leave both unchanged.
    created: Option<std::time::SystemTime>,
}

impl MarkerIdentity {
    pub fn of(metadata: &Metadata) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Self {
                dev: metadata.dev(),
                ino: metadata.ino(),
                created: metadata.created().ok(),
            }
        }
        #[cfg(not(unix))]
        {
            Self {
                created: metadata.created().ok(),
            }
        }
    }

    /// Identity of the file currently at `path`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for any failure other than the file being absent.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        match std::fs::metadata(path) {
            Ok(metadata) => Ok(Some(Self::of(&metadata))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Marker file whose presence keeps the tracker running.
///
/// Created (or truncated) by [`LockFile::create`] and removed again when the
/// guard is dropped, unless another file has taken its place meanwhile.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    identity: MarkerIdentity,
}

impl LockFile {
    /// Create the marker at `path`, truncating an existing file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = std::fs::File::create(&path)?;
        let identity = MarkerIdentity::of(&file.metadata()?);
        info!(path = %path.display(), "lock file created");
        Ok(Self { path, identity })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let outcome = match MarkerIdentity::read(&self.path) {
            Ok(Some(identity)) if identity != self.identity => {
                info!(path = %self.path.display(), "lock file belongs to another instance, leaving it");
                return;
            }
            Ok(Some(_)) => remove(&self.path),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(true) => info!(path = %self.path.display(), "lock file removed"),
            Ok(false) => info!(path = %self.path.display(), "lock file already removed"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove lock file"),
        }
    }
}

/// Remove the marker at `path`.
///
/// Returns `Ok(false)` when there was nothing to remove.
///
/// # Errors
///
/// Returns an I/O error for any failure other than the file being absent.
pub fn remove(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
