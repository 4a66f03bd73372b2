//! Decode-time error vocabulary (SPEC_FULL.md §4.1 / §7), styled on
//! `av1an_core::error::Error`: one `thiserror` enum, `#[from]` where a
//! lower-level error maps cleanly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("corrupt compact block envelope")]
    CorruptEnvelope,

    #[error("failed to decompress compact block body: {0}")]
    CompressionError(#[from] std::io::Error),

    #[error("expression does not match the declared schema: {0}")]
    SchemaMismatch(String),

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("filter {name} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("pool reference out of range: {pool} index {index} (len {len})")]
    OutOfRangePoolRef {
        pool: &'static str,
        index: usize,
        len: usize,
    },

    #[error("ILoc index {index} out of range for source {source} (len {len})")]
    ILocOutOfRange {
        source: String,
        index: i64,
        len: usize,
    },

    #[error("expression tree exceeds max depth or repeats a node: {0}")]
    CyclicOrTooDeep(String),

    #[error("duplicate kwarg key {0:?} on filter node")]
    DuplicateKwarg(String),

    #[error("filter {filter} does not accept kwarg {key:?}")]
    UnknownKwarg { filter: String, key: String },

    #[error("filter {filter} is missing required kwarg(s): {}", .keys.join(", "))]
    MissingRequiredKwarg { filter: String, keys: Vec<String> },
}
