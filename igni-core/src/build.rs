//! The segment build pipeline (C3→C4→C5→C6): resolve an expression tree's
//! source dependencies, decode the frames it needs, evaluate every root in
//! the segment, scale to the spec's output format, and mux one MPEG-TS
//! segment.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bytes::Bytes;
use igni_decode::{PixFmt, RasterFrame, SourceJob};
use igni_expr::{resolve_roots, FrameExpr, Rational};
use igni_filter::eval_segment;
use igni_mux::{encode_segment, SegmentSpec};
use igni_source::SourceRegistry;

use crate::error::BuildError;

/// Everything [`build_segment`] needs to know about the target output,
/// independent of spec state — a narrower view than [`crate::spec::SpecDescriptor`]
/// so this function has no dependency on the spec map itself.
pub struct SegmentTarget {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: PixFmt,
    pub frame_rate: Rational,
    pub encoder_binary: String,
    pub encoder_args: Vec<String>,
}

/// Builds one segment's MPEG-TS bytes from its ordered list of frame
/// expression roots. `cancelled` is checked between decode groups and
/// between filter-evaluation fan-out tasks, so an HTTP client disconnect
/// aborts the build at the next safe boundary (SPEC_FULL.md §5).
fn render_frames(
    roots: &[FrameExpr],
    target_width: u32,
    target_height: u32,
    target_pix_fmt: PixFmt,
    registry: &Arc<SourceRegistry>,
    decode_workers: usize,
    filter_workers: usize,
    cancelled: &AtomicBool,
) -> Result<Vec<RasterFrame>, BuildError> {
    let deps = resolve_roots(roots, registry.as_ref())?;

    let mut jobs = Vec::with_capacity(deps.len());
    for (source_id, pts_set) in deps {
        let handle = registry
            .get(&source_id)
            .ok_or_else(|| BuildError::Source(igni_source::SourceError::NotFound(source_id.to_string())))?;
        jobs.push(SourceJob {
            handle,
            required: pts_set.into_iter().collect(),
        });
    }

    let frame_map = igni_decode::decode_jobs(jobs, decode_workers, cancelled)?;
    let evaluated = eval_segment(roots, &frame_map, registry.as_ref(), filter_workers, cancelled)?;

    let mut ready = Vec::with_capacity(evaluated.len());
    for frame in evaluated {
        let scaled = igni_filter::scale(&frame, target_width, target_height, target_pix_fmt)?;
        ready.push(scaled);
    }
    Ok(ready)
}

pub fn build_segment(
    roots: &[FrameExpr],
    target: &SegmentTarget,
    registry: &Arc<SourceRegistry>,
    decode_workers: usize,
    filter_workers: usize,
    cancelled: &AtomicBool,
) -> Result<Bytes, BuildError> {
    let ready = render_frames(
        roots,
        target.width,
        target.height,
        target.pix_fmt,
        registry,
        decode_workers,
        filter_workers,
        cancelled,
    )?;

    let segment_spec = SegmentSpec {
        width: target.width,
        height: target.height,
        pix_fmt: target.pix_fmt,
        frame_rate: target.frame_rate,
        frame_count: ready.len(),
        encoder_binary: target.encoder_binary.clone(),
        encoder_args: target.encoder_args.clone(),
    };
    let ts_bytes = encode_segment(&segment_spec, &ready)?;
    Ok(Bytes::from(ts_bytes))
}

/// Renders a single frame expression to a raw raster, without muxing —
/// the debug render path behind `POST /v2/frame` (SPEC_FULL.md §6).
pub fn render_single_frame(
    root: &FrameExpr,
    width: u32,
    height: u32,
    pix_fmt: PixFmt,
    registry: &Arc<SourceRegistry>,
    decode_workers: usize,
    filter_workers: usize,
    cancelled: &AtomicBool,
) -> Result<RasterFrame, BuildError> {
    let roots = std::slice::from_ref(root);
    let mut ready = render_frames(roots, width, height, pix_fmt, registry, decode_workers, filter_workers, cancelled)?;
    ready.pop().ok_or_else(|| BuildError::NotReady {
        spec: "<frame>".to_string(),
        segment: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_segment_roots_resolve_to_no_jobs() {
        let registry = Arc::new(SourceRegistry::new());
        let deps = resolve_roots(&[], registry.as_ref()).unwrap();
        assert!(deps.is_empty());
    }
}
