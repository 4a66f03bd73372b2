//! The decode worker pool (C4): distinct sources decode in parallel up to
//! `Configuration::decode_workers`; within one source, decoding stays on a
//! single worker thread since the demuxer/decoder pair is `!Sync`. Built on
//! the same `crossbeam_channel` + `crossbeam_utils::thread::scope` shape as
//! `av1an_core::broker::Broker::encoding_loop`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use igni_expr::{Rational, SourceId};
use igni_source::SourceHandle;

use crate::error::PlanError;
use crate::frame::{PixFmt, RasterFrame};
use crate::plan::{build_plan, SeekGroup};

/// One source's worth of decode work: its handle plus the PTS values a
/// segment build needs from it.
pub struct SourceJob {
    pub handle: Arc<SourceHandle>,
    pub required: Vec<Rational>,
}

pub type FrameMap = HashMap<(SourceId, Rational), Arc<RasterFrame>>;

/// Decodes every job's required frames, using up to `max_workers` threads
/// concurrently (one thread per source at a time). Checked against
/// `cancelled` between GOP groups so a dropped HTTP stream can abort a
/// build promptly.
pub fn decode_jobs(jobs: Vec<SourceJob>, max_workers: usize, cancelled: &AtomicBool) -> Result<FrameMap, PlanError> {
    if jobs.is_empty() {
        return Ok(FrameMap::new());
    }
    let max_workers = max_workers.max(1).min(jobs.len());
    let (sender, receiver) = crossbeam_channel::bounded(jobs.len());
    for job in jobs {
        sender.send(job).expect("channel sized to job count");
    }
    drop(sender);

    let results: Vec<Result<Vec<((SourceId, Rational), RasterFrame)>, PlanError>> = crossbeam_utils::thread::scope(|scope| {
        let handles: Vec<_> = (0..max_workers)
            .map(|_| {
                let rx = receiver.clone();
                scope.spawn(move |_| {
                    let mut out = Vec::new();
                    while let Ok(job) = rx.recv() {
                        let frames = decode_source(&job.handle, &job.required, cancelled)?;
                        out.extend(frames);
                    }
                    Ok(out)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("decode worker panicked")).collect()
    })
    .expect("decode worker pool scope failed");

    let mut map = FrameMap::new();
    for result in results {
        for (key, frame) in result? {
            map.insert(key, Arc::new(frame));
        }
    }
    Ok(map)
}

fn decode_source(
    handle: &SourceHandle,
    required: &[Rational],
    cancelled: &AtomicBool,
) -> Result<Vec<((SourceId, Rational), RasterFrame)>, PlanError> {
    let groups = build_plan(required, &handle.ts);
    let mut ictx = ffmpeg::format::input(&handle.path).map_err(|cause| PlanError::Ffmpeg {
        source: handle.id.clone(),
        cause,
    })?;
    let stream = ictx
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| PlanError::Ffmpeg {
            source: handle.id.clone(),
            cause: ffmpeg::Error::StreamNotFound,
        })?;
    let video_stream_index = stream.index();
    let timebase = stream.time_base();

    let mut decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|cause| PlanError::Ffmpeg {
            source: handle.id.clone(),
            cause,
        })?
        .decoder()
        .video()
        .map_err(|cause| PlanError::Ffmpeg {
            source: handle.id.clone(),
            cause,
        })?;

    let mut scaler = ffmpeg::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg::format::Pixel::BGR24,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::Flags::BILINEAR,
    )
    .map_err(|cause| PlanError::Ffmpeg {
        source: handle.id.clone(),
        cause,
    })?;

    let mut out = Vec::new();
    for group in groups {
        if cancelled.load(Ordering::Relaxed) {
            return Err(PlanError::Cancelled);
        }
        decode_group(
            &mut ictx,
            video_stream_index,
            timebase,
            &mut decoder,
            &mut scaler,
            handle,
            &group,
            &mut out,
        )?;
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn decode_group(
    ictx: &mut ffmpeg::format::context::Input,
    video_stream_index: usize,
    timebase: ffmpeg::Rational,
    decoder: &mut ffmpeg::decoder::Video,
    scaler: &mut ffmpeg::software::scaling::Context,
    handle: &SourceHandle,
    group: &SeekGroup,
    out: &mut Vec<((SourceId, Rational), RasterFrame)>,
) -> Result<(), PlanError> {
    let seek_ts = (group.keyframe_pts.to_f64() * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
    ictx.seek(seek_ts, ..seek_ts).map_err(|cause| PlanError::Ffmpeg {
        source: handle.id.clone(),
        cause,
    })?;

    let mut remaining: std::collections::BTreeSet<_> = group.required.iter().copied().collect();
    let mut decoded = ffmpeg::util::frame::Video::empty();

    let mut drain = |decoder: &mut ffmpeg::decoder::Video,
                      out: &mut Vec<((SourceId, Rational), RasterFrame)>,
                      remaining: &mut std::collections::BTreeSet<Rational>|
     -> Result<(), PlanError> {
        while decoder.receive_frame(&mut decoded).is_ok() {
            let Some(frame_pts) = decoded.timestamp() else {
                continue;
            };
            let pts = Rational::new(
                frame_pts * i64::from(timebase.numerator()),
                i64::from(timebase.denominator()),
            );
            if !remaining.contains(&pts) {
                continue;
            }
            let mut scaled = ffmpeg::util::frame::Video::empty();
            scaler.run(&decoded, &mut scaled).map_err(|cause| PlanError::Ffmpeg {
                source: handle.id.clone(),
                cause,
            })?;
            let raster = raster_from_bgr24(&scaled);
            out.push(((handle.id.clone(), pts), raster));
            remaining.remove(&pts);
        }
        Ok(())
    };

    for (stream, packet) in ictx.packets() {
        if remaining.is_empty() {
            break;
        }
        if stream.index() != video_stream_index {
            continue;
        }
        decoder.send_packet(&packet).map_err(|cause| PlanError::Ffmpeg {
            source: handle.id.clone(),
            cause,
        })?;
        drain(decoder, out, &mut remaining)?;
    }
    if !remaining.is_empty() {
        decoder.send_eof().ok();
        drain(decoder, out, &mut remaining)?;
    }
    Ok(())
}

fn raster_from_bgr24(frame: &ffmpeg::util::frame::Video) -> RasterFrame {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let tight_stride = width as usize * 3;
    let plane = frame.data(0);

    let mut data = Vec::with_capacity(tight_stride * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        data.extend_from_slice(&plane[start..start + tight_stride]);
    }

    RasterFrame {
        width,
        height,
        pix_fmt: PixFmt::Bgr24,
        data,
    }
}
