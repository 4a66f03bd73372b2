//! Source-registry error vocabulary, in the same `thiserror` style as
//! `igni_expr::error::DecodeError` and `av1an_core::error::Error`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open source at {path}: {cause}")]
    Open { path: PathBuf, cause: ffmpeg::Error },

    #[error("source at {0} has no video stream")]
    NoVideoStream(PathBuf),

    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("storage path escapes backend root: {0}")]
    PathEscapesRoot(String),

    #[error("source not found: {0}")]
    NotFound(String),

    #[error(
        "source {source_id} was re-opened with a different probe result than its cached \
         one (storage_uri={storage_uri}); sources are immutable once registered"
    )]
    ProbeMismatch { source_id: String, storage_uri: String },
}
