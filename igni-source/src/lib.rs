//! Source registry, probe cache, and storage backends (C2).

pub mod error;
pub mod probe;
pub mod registry;
pub mod storage;

pub use error::SourceError;
pub use probe::{probe, ProbeResult, TsEntry};
pub use registry::{ProbeKey, SourceHandle, SourceRegistry};
pub use storage::{backend_for, FsBackend, StorageBackend};
