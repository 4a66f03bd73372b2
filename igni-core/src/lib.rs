//! Spec state machine (C7) and HLS endpoint layer (C8): the process-wide
//! registries, the segment build pipeline wiring C3 through C6, playlist
//! rendering, and the HTTP-facing error surface.

pub mod build;
pub mod error;
pub mod ids;
pub mod playlist;
pub mod spec;
pub mod store;
pub mod tenant;

pub use build::{build_segment, render_single_frame, SegmentTarget};
pub use error::{ApiError, BuildError, CachedBuildError, StateError};
pub use ids::{SpecId, TenantId};
pub use igni_decode::PixFmt;
pub use spec::{PartRow, SpecDescriptor, SpecState};
pub use store::{AppState, SpecEntry};
pub use tenant::{static_resolver, TokenResolver};
