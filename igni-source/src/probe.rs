//! Single-pass source probing: opens a file with `ffmpeg-next`, walks its
//! video packets once, and records a rational PTS + keyframe flag per
//! frame. Generalizes `av1an_core::ffmpeg::get_keyframes`/`num_frames`
//! (which only ever wanted keyframe positions and a frame count) to also
//! keep every packet's presentation timestamp, since the dependency
//! resolver needs to address frames by PTS, not just by index.

use std::path::Path;

use igni_expr::Rational;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsEntry {
    pub pts: Rational,
    pub is_keyframe: bool,
}

#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub ts: Vec<TsEntry>,
}

pub fn probe(path: &Path) -> Result<ProbeResult, SourceError> {
    let mut ictx = ffmpeg::format::input(&path).map_err(|cause| SourceError::Open {
        path: path.to_path_buf(),
        cause,
    })?;

    let stream = ictx
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| SourceError::NoVideoStream(path.to_path_buf()))?;
    let video_stream_index = stream.index();
    let timebase = stream.time_base();

    let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|cause| SourceError::Open {
            path: path.to_path_buf(),
            cause,
        })?
        .decoder()
        .video()
        .map_err(|cause| SourceError::Open {
            path: path.to_path_buf(),
            cause,
        })?;

    let width = decoder.width();
    let height = decoder.height();
    let pix_fmt = format!("{:?}", decoder.format());

    let mut ts = Vec::new();
    for (stream, packet) in ictx.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        let Some(packet_pts) = packet.pts() else {
            continue;
        };
        let pts = Rational::new(
            packet_pts * i64::from(timebase.numerator()),
            i64::from(timebase.denominator()),
        );
        ts.push(TsEntry {
            pts,
            is_keyframe: packet.is_key(),
        });
    }

    ts.sort_by_key(|entry| entry.pts);

    if ts.is_empty() {
        ts.push(TsEntry {
            pts: Rational::zero(),
            is_keyframe: true,
        });
    } else if !ts[0].is_keyframe {
        // The timestamp table's invariant requires index 0 to be a
        // keyframe; force it rather than surface a spurious error for
        // containers whose first packet lacks the key flag.
        ts[0].is_keyframe = true;
    }

    Ok(ProbeResult {
        width,
        height,
        pix_fmt,
        ts,
    })
}
