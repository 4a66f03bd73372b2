//! Decode planner / pool errors, in the same `thiserror` shape as the rest
//! of the workspace.

use igni_expr::SourceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("source registry error: {0}")]
    Source(#[from] igni_source::SourceError),

    #[error("ffmpeg error decoding source {source}: {cause}")]
    Ffmpeg { source: SourceId, cause: ffmpeg::Error },

    #[error("segment build cancelled")]
    Cancelled,

    #[error("source {0} has no registered handle")]
    UnknownSource(SourceId),
}
