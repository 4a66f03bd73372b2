//! Raster frame type, seek planning, and the decode worker pool (C4).

pub mod error;
pub mod frame;
pub mod plan;
pub mod pool;

pub use error::PlanError;
pub use frame::{PixFmt, RasterFrame};
pub use plan::{build_plan, SeekGroup};
pub use pool::{decode_jobs, FrameMap, SourceJob};
