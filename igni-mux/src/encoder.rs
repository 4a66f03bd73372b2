//! Spawns the configured encoder binary as a child process with piped
//! stdio, the same shape as `av1an_core::ffmpeg::compose_ffmpeg_pipe` /
//! `encode_audio`: a writer thread feeds raw frames to stdin while the
//! calling thread reads the muxed segment back from stdout.

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use igni_decode::{PixFmt, RasterFrame};
use igni_expr::Rational;

use crate::error::{EncodeError, EncoderCrash};

/// Segment-level encode parameters, independent of any one frame.
pub struct SegmentSpec {
    pub width: u32,
    pub height: u32,
    /// Encode pixel format. Defaults to `Yuv420p` per SPEC_FULL.md §4.6
    /// ("pixel format for encode is yuv420p unless the spec specifies
    /// otherwise"), but every frame handed to [`encode_segment`] must
    /// already be in this format — [`crate`]'s caller is responsible for
    /// scaling into it.
    pub pix_fmt: PixFmt,
    pub frame_rate: Rational,
    pub frame_count: usize,
    pub encoder_binary: String,
    pub encoder_args: Vec<String>,
}

/// Builds the full encoder command line: a `rawvideo` stdin feed in the
/// segment's pixel format, the configured encoder args, and an `mpegts`
/// stdout mux. Forces an IDR on the segment's first frame and a GOP
/// spanning the whole segment, so every segment is independently seekable.
pub fn compose_encoder_args(spec: &SegmentSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        spec.pix_fmt.rawvideo_name().into(),
        "-s".into(),
        format!("{}x{}", spec.width, spec.height),
        "-r".into(),
        format!("{}", spec.frame_rate.to_f64()),
        "-i".into(),
        "-".into(),
        "-an".into(),
    ];
    args.extend(spec.encoder_args.iter().cloned());
    args.extend([
        "-g".into(),
        spec.frame_count.to_string(),
        "-sc_threshold".into(),
        "0".into(),
        "-force_key_frames".into(),
        "expr:eq(n,0)".into(),
        "-f".into(),
        "mpegts".into(),
        "-".into(),
    ]);
    args
}

/// Encodes a strictly-ordered, already-`Yuv420p` sequence of frames into
/// one MPEG-TS segment's bytes.
pub fn encode_segment(spec: &SegmentSpec, frames: &[RasterFrame]) -> Result<Vec<u8>, EncodeError> {
    for frame in frames {
        if frame.pix_fmt != spec.pix_fmt {
            return Err(EncodeError::WrongPixFmt {
                expected: spec.pix_fmt,
                found: frame.pix_fmt,
            });
        }
    }

    let args = compose_encoder_args(spec);
    let mut child = Command::new(&spec.encoder_binary)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(EncodeError::Spawn)?;

    let mut stdin = child.stdin.take().expect("stdin was piped");
    let frames_owned: Vec<Vec<u8>> = frames.iter().map(|f| f.data.clone()).collect();
    let writer = std::thread::spawn(move || -> std::io::Result<()> {
        for data in frames_owned {
            stdin.write_all(&data)?;
        }
        Ok(())
    });

    let mut stdout_buf = Vec::new();
    child
        .stdout
        .take()
        .expect("stdout was piped")
        .read_to_end(&mut stdout_buf)
        .map_err(EncodeError::Spawn)?;

    let mut stderr_buf = Vec::new();
    child
        .stderr
        .take()
        .expect("stderr was piped")
        .read_to_end(&mut stderr_buf)
        .ok();

    let _ = writer.join();
    let status = child.wait().map_err(EncodeError::Spawn)?;

    if !status.success() {
        return Err(EncodeError::Crash(EncoderCrash {
            exit_status: status,
            stdout: stdout_buf.into(),
            stderr: stderr_buf.into(),
        }));
    }

    Ok(stdout_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_forces_idr_and_mpegts() {
        let spec = SegmentSpec {
            width: 640,
            height: 480,
            pix_fmt: PixFmt::Yuv420p,
            frame_rate: Rational::new(30, 1),
            frame_count: 60,
            encoder_binary: "ffmpeg".into(),
            encoder_args: vec!["-c:v".into(), "libx264".into()],
        };
        let args = compose_encoder_args(&spec);
        assert!(args.windows(2).any(|w| w == ["-force_key_frames", "expr:eq(n,0)"]));
        assert!(args.windows(2).any(|w| w == ["-g", "60"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert_eq!(args.last().map(String::as_str), Some("-"));
        assert!(args.iter().any(|a| a == "mpegts"));
    }
}
