//! Resolves a `(storage_service, storage_config)` pair from a `POST
//! /v2/source` body into a local filesystem path. A small trait rather than
//! a fixed enum, so a new backend (object storage, say) is an additional
//! impl rather than a match arm added everywhere — matching the original
//! project's `"storage_service": "fs", "storage_config": {"root": "."}"`
//! convention for its one built-in backend.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use path_abs::{PathAbs, PathInfo};

use crate::error::SourceError;

pub trait StorageBackend {
    /// Resolves a caller-supplied relative location to a local path this
    /// process can open with ffmpeg.
    fn resolve(&self, location: &str) -> Result<PathBuf, SourceError>;
}

/// The only storage backend this crate ships: a root directory plus a
/// relative path, joined and canonicalized, rejecting any `..` component
/// that would escape the root.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBackend { root: root.into() }
    }

    pub fn from_config(config: &HashMap<String, String>) -> Self {
        let root = config.get("root").cloned().unwrap_or_else(|| ".".to_string());
        FsBackend::new(root)
    }
}

impl StorageBackend for FsBackend {
    fn resolve(&self, location: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(location);
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
        {
            return Err(SourceError::PathEscapesRoot(location.to_string()));
        }
        let joined = self.root.join(relative);
        PathAbs::new(&joined)
            .map(|p| p.as_path().to_path_buf())
            .map_err(|_| SourceError::NotFound(location.to_string()))
    }
}

/// Builds the configured backend for a `storage_service` name.
pub fn backend_for(service: &str, config: &HashMap<String, String>) -> Result<Box<dyn StorageBackend + Send + Sync>, SourceError> {
    match service {
        "fs" => Ok(Box::new(FsBackend::from_config(config))),
        other => Err(SourceError::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_dir_escape() {
        let backend = FsBackend::new("/srv/videos");
        let err = backend.resolve("../etc/passwd").unwrap_err();
        assert!(matches!(err, SourceError::PathEscapesRoot(_)));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = backend_for("s3", &HashMap::new()).unwrap_err();
        assert!(matches!(err, SourceError::UnknownBackend(_)));
    }
}
