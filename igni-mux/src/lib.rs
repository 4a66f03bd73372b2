//! Segment encoder/muxer.
//!
//! Rather than linking an encoder library, segments are produced by
//! spawning a configured encoder binary as a child process with piped
//! stdio, the same pattern `av1an_core` uses to drive its encoders.

mod encoder;
mod error;
mod string_or_bytes;

pub use encoder::{compose_encoder_args, encode_segment, SegmentSpec};
pub use error::{EncodeError, EncoderCrash};
pub use string_or_bytes::StringOrBytes;
