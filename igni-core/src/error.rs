//! Spec state machine errors (C7) and the HTTP-facing `ApiError` that maps
//! every domain error onto the status-code table in SPEC_FULL.md §7, the
//! same "narrow enum at the boundary wraps rich errors from below" shape as
//! `av1an_core::error::Error`'s `#[from]` conversions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Transitions rejected by [`crate::spec::SpecState::push_part`]
/// (SPEC_FULL.md §4.7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("part at pos {0} already exists")]
    AlreadyExists(u64),

    #[error("part at pos {pos} (length {len}) writes past the declared terminal at {terminal_pos}")]
    PastTerminal { pos: u64, len: u64, terminal_pos: u64 },

    #[error("non-terminal part at pos {0} has zero frames")]
    EmptyNonTerminal(u64),

    #[error("spec is already terminated")]
    Terminated,
}

/// Errors surfaced while assembling one segment's MPEG-TS bytes
/// (C3→C4→C5→C6 pipeline).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("expression decode error: {0}")]
    Decode(#[from] igni_expr::DecodeError),

    #[error("source error: {0}")]
    Source(#[from] igni_source::SourceError),

    #[error("decode planner error: {0}")]
    Plan(#[from] igni_decode::PlanError),

    #[error("filter evaluation error: {0}")]
    Render(#[from] igni_filter::RenderError),

    #[error("encoder error: {0}")]
    Encode(#[from] igni_mux::EncodeError),

    #[error("segment {spec}/{segment} is not yet ready")]
    NotReady { spec: String, segment: u64 },

    #[error("segment build exceeded its deadline")]
    Timeout,

    #[error("segment build cancelled")]
    Cancelled,
}

/// The HTTP-facing error surface (SPEC_FULL.md §7's status-code table).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("bad expression: {0}")]
    Decode(#[from] igni_expr::DecodeError),

    #[error("state violation: {0}")]
    StateViolation(#[from] StateError),

    #[error("source open error: {0}")]
    SourceOpen(#[source] igni_source::SourceError),

    #[error("render error: {0}")]
    Render(#[source] igni_filter::RenderError),

    #[error("segment build timed out")]
    Timeout,
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Decode(e) => ApiError::Decode(e),
            BuildError::Source(e) => ApiError::SourceOpen(e),
            BuildError::Plan(igni_decode::PlanError::Source(e)) => ApiError::SourceOpen(e),
            BuildError::Plan(e) => ApiError::Render(igni_filter::RenderError::new("<decode>", None, e.to_string())),
            BuildError::Render(e) => ApiError::Render(e),
            BuildError::Encode(e) => ApiError::Render(igni_filter::RenderError::new("<encode>", None, e.to_string())),
            BuildError::NotReady { spec, segment } => ApiError::NotFound(format!("segment {segment} of spec {spec}")),
            BuildError::Timeout => ApiError::Timeout,
            BuildError::Cancelled => ApiError::Timeout,
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::StateViolation(_) => StatusCode::BAD_REQUEST,
            ApiError::SourceOpen(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// A [`BuildError`] flattened to its status code and message so it can sit
/// in the segment-build memoization cell (SPEC_FULL.md §4.8) without
/// requiring `BuildError`'s leaf causes — `ffmpeg::Error`, `std::io::Error`
/// — to implement `Clone`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CachedBuildError {
    pub status: StatusCode,
    pub message: String,
}

impl From<BuildError> for CachedBuildError {
    fn from(err: BuildError) -> Self {
        let status = match &err {
            BuildError::Decode(_) => StatusCode::BAD_REQUEST,
            BuildError::Source(_) | BuildError::Plan(_) | BuildError::Render(_) | BuildError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BuildError::NotReady { .. } => StatusCode::NOT_FOUND,
            BuildError::Timeout | BuildError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        CachedBuildError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for CachedBuildError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
