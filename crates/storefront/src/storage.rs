//! Local cart persistence.
//!
//! Holds the last synced cart line list in a single JSON file. The file is
//! always replaced wholesale (write to a sibling temp file, then rename), so
//! concurrent writers cannot interleave: the last rename wins.
//!
//! Persistence is best effort. Every operation is synchronous and infallible
//! from the caller's point of view; I/O and decode failures are logged and
//! degrade to a no-op or an absent read.

use std::io;
use std::path::{Path, PathBuf};

use amber_market_core::CartLine;
use uuid::Uuid;

/// File-backed store for the cart line list.
#[derive(Debug, Clone, Default)]
pub struct LocalCartStore {
    path: Option<PathBuf>,
}

impl LocalCartStore {
    /// Store the cart at `path`. Parent directories are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A store with no backing file: reads are always absent, writes are
    /// dropped.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { path: None }
    }

    /// The backing file, if persistence is enabled.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The last persisted line list, or `None` if nothing usable is stored.
    #[must_use]
    pub fn read(&self) -> Option<Vec<CartLine>> {
        let path = self.path.as_deref()?;

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to read local cart");
                return None;
            }
        };

        match serde_json::from_slice::<Vec<CartLine>>(&bytes) {
            Ok(lines) => Some(lines),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Discarding unreadable local cart");
                None
            }
        }
    }

    /// Persist `lines`, replacing any previous value.
    pub fn write(&self, lines: &[CartLine]) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        if let Err(e) = write_atomically(path, lines) {
            tracing::warn!(error = %e, path = %path.display(), "Failed to persist local cart");
        }
    }

    /// Remove any persisted value.
    pub fn erase(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to erase local cart");
            }
        }
    }
}

fn write_atomically(path: &Path, lines: &[CartLine]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec(lines).map_err(io::Error::other)?;

    let file_name = path
        .file_name()
        .map_or_else(|| "cart".into(), |n| n.to_string_lossy().into_owned());
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}
