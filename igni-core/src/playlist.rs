//! HLS endpoint layer (C8): master/media playlist rendering via `m3u8-rs`,
//! matching the exact literal tag set SPEC_FULL.md §4.8 requires, plus the
//! small `/status` JSON body.

use m3u8_rs::{MasterPlaylist, MediaPlaylist, MediaPlaylistType, MediaSegment, Playlist, Start, VariantStream};
use serde::Serialize;

use crate::spec::{SpecDescriptor, SpecState};

/// Readiness: segment `k` is listed iff `(k+1)*segment_frames <= F`, or the
/// spec is closed and `k*segment_frames < N`.
pub fn ready_segment_count(state: &SpecState, segment_frames: u64) -> u64 {
    if segment_frames == 0 {
        return 0;
    }
    let n = state.committed_frames();
    if state.closed() {
        (n + segment_frames - 1) / segment_frames
    } else {
        state.frontier() / segment_frames
    }
}

/// Duration in seconds of segment `k`, truncated to the trailing partial
/// segment's actual frame count once the spec is closed. This is the
/// implementer's choice SPEC_FULL.md §9 leaves open for non-integer
/// `segment_length * frame_rate`: we keep full precision here (no
/// rounding beyond `f32`'s own) and only round at `EXT-X-TARGETDURATION`,
/// which the HLS spec requires to be an integer.
pub fn segment_duration_secs(descriptor: &SpecDescriptor, state: &SpecState, k: u64) -> f32 {
    let segment_frames = descriptor.segment_frames();
    let full = descriptor.segment_length.to_f64();
    if !state.closed() {
        return full as f32;
    }
    let n = state.committed_frames();
    let end = (k + 1) * segment_frames;
    if end <= n {
        full as f32
    } else {
        let remaining = n.saturating_sub(k * segment_frames);
        (remaining as f64 / descriptor.frame_rate.to_f64()) as f32
    }
}

/// Renders `GET /vod/{id}/stream.m3u8`'s media playlist text.
pub fn render_media_playlist(descriptor: &SpecDescriptor, state: &SpecState) -> String {
    let segment_frames = descriptor.segment_frames().max(1);
    let ready = ready_segment_count(state, segment_frames);

    let segments: Vec<MediaSegment> = (0..ready)
        .map(|k| MediaSegment {
            uri: format!("segment-{k}.ts"),
            duration: segment_duration_secs(descriptor, state, k),
            ..Default::default()
        })
        .collect();

    let all_emitted = state.closed() && ready == (state.committed_frames() + segment_frames - 1) / segment_frames;

    let playlist = MediaPlaylist {
        version: Some(4),
        target_duration: descriptor.segment_length.to_f64().ceil() as f32,
        media_sequence: 0,
        end_list: all_emitted,
        playlist_type: Some(MediaPlaylistType::Event),
        start: Some(Start {
            time_offset: 0.0,
            precise: false,
        }),
        segments,
        ..Default::default()
    };

    let mut buf = Vec::new();
    playlist
        .write_to(&mut buf)
        .expect("writing to an in-memory buffer cannot fail");
    String::from_utf8(buf).expect("m3u8-rs emits UTF-8 text")
}

/// Renders `GET /vod/{id}/playlist.m3u8`'s master playlist text: a single
/// variant pointing at `stream.m3u8`, since there is no adaptive bitrate
/// ladder (SPEC_FULL.md §1's non-goals).
pub fn render_master_playlist() -> String {
    let playlist = MasterPlaylist {
        version: Some(4),
        variants: vec![VariantStream {
            uri: "stream.m3u8".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut buf = Vec::new();
    Playlist::MasterPlaylist(playlist)
        .write_to(&mut buf)
        .expect("writing to an in-memory buffer cannot fail");
    String::from_utf8(buf).expect("m3u8-rs emits UTF-8 text")
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecStatus {
    pub closed: bool,
    pub terminated: bool,
    pub ready: bool,
}

pub fn status_of(state: &SpecState, segment_frames: u64) -> SpecStatus {
    SpecStatus {
        closed: state.closed(),
        terminated: state.terminal_pos().is_some(),
        ready: ready_segment_count(state, segment_frames.max(1)) > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igni_expr::{Data, FrameExpr, Rational};
    use std::time::SystemTime;

    fn descriptor() -> SpecDescriptor {
        SpecDescriptor {
            id: crate::ids::SpecId::new(),
            tenant: crate::ids::TenantId("acme".into()),
            width: 1280,
            height: 720,
            pix_fmt: "yuv420p".into(),
            segment_length: Rational::new(2, 1),
            frame_rate: Rational::new(30, 1),
            ready_hook: None,
            steer_hook: None,
            created_at: SystemTime::UNIX_EPOCH,
            expires_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn frames(n: u64) -> Vec<(Rational, FrameExpr)> {
        (0..n)
            .map(|i| (Rational::new(i as i64, 30), FrameExpr::data(Data::Int(i as i64))))
            .collect()
    }

    #[test]
    fn single_segment_vod_lists_one_segment_and_endlist() {
        let descriptor = descriptor();
        let mut state = SpecState::new();
        state.push_part(0, frames(60), true).unwrap();

        let segment_frames = descriptor.segment_frames();
        assert_eq!(segment_frames, 60);
        assert_eq!(ready_segment_count(&state, segment_frames), 1);

        let text = render_media_playlist(&descriptor, &state);
        assert_eq!(text.matches("#EXTINF:").count(), 1);
        assert!(text.contains("#EXT-X-ENDLIST"));
        assert!(text.contains("EXT-X-PLAYLIST-TYPE:EVENT"));
        assert!(text.contains("EXT-X-VERSION:4"));
        assert!(text.contains("EXT-X-MEDIA-SEQUENCE:0"));
        assert!(text.contains("segment-0.ts"));
    }

    #[test]
    fn open_spec_has_no_endlist() {
        let descriptor = descriptor();
        let mut state = SpecState::new();
        state.push_part(0, frames(60), false).unwrap();
        let text = render_media_playlist(&descriptor, &state);
        assert!(!text.contains("#EXT-X-ENDLIST"));
    }

    #[test]
    fn master_playlist_points_at_stream_playlist() {
        let text = render_master_playlist();
        assert!(text.contains("stream.m3u8"));
    }
}
