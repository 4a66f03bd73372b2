//! Request/response bodies for the HTTP surface table in SPEC_FULL.md §6.
//! Kept as a separate module from the route handlers so the wire shapes
//! are easy to audit independent of the routing/auth plumbing.

use std::collections::HashMap;

use igni_expr::{FrameExpr, Rational};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SourceCreateRequest {
    pub name: String,
    pub stream_idx: u32,
    pub storage_service: String,
    pub storage_config: HashMap<String, String>,
    /// Relative path/key resolved by the chosen storage backend. Not named
    /// in SPEC_FULL.md's request-body sketch but required for the backend
    /// to locate the file; the admin API out-of-scope boundary means this
    /// crate only needs *a* location field, not the full admin schema.
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct StatusIdResponse {
    pub status: &'static str,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct SourceDescriptorResponse {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub ts: Vec<(i64, i64, bool)>,
}

#[derive(Debug, Deserialize)]
pub struct SpecCreateRequest {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub vod_segment_length: [i64; 2],
    pub frame_rate: [i64; 2],
    #[serde(default)]
    pub ready_hook: Option<String>,
    #[serde(default)]
    pub steer_hook: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpecDescriptorResponse {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub frames_applied: u64,
    pub terminated: bool,
    pub closed: bool,
    pub vod_endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct PartPushRequest {
    pub pos: u64,
    pub terminal: bool,
    pub frames: Vec<(Rational, FrameExpr)>,
}

#[derive(Debug, Deserialize)]
pub struct PartBlockEntry {
    pub frames: u32,
    #[serde(default)]
    pub compression: Option<String>,
    /// Base64-encoded compact-block envelope body, per SPEC_FULL.md §6.
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PartBlockRequest {
    pub pos: u64,
    pub terminal: bool,
    pub blocks: Vec<PartBlockEntry>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub status: &'static str,
}

impl Default for OkResponse {
    fn default() -> Self {
        OkResponse { status: "ok" }
    }
}

#[derive(Debug, Deserialize)]
pub struct FrameRenderRequest {
    /// Base64-encoded compact-block envelope carrying exactly one root.
    pub block: String,
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    #[serde(default)]
    pub compression: Option<String>,
}
