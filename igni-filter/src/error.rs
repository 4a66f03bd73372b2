//! Filter evaluation errors. One failure fails the whole segment — there is
//! no partial-segment output — so `RenderError` carries enough to log
//! exactly which frame and filter caused it, matching the distilled spec's
//! `RenderError{filter, frame_pts, cause}`.

use igni_expr::Rational;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("filter {filter} failed at frame pts {frame_pts:?}: {cause}")]
pub struct RenderError {
    pub filter: String,
    pub frame_pts: Option<Rational>,
    pub cause: String,
}

impl RenderError {
    pub fn new(filter: impl Into<String>, frame_pts: Option<Rational>, cause: impl Into<String>) -> Self {
        RenderError {
            filter: filter.into(),
            frame_pts,
            cause: cause.into(),
        }
    }
}
