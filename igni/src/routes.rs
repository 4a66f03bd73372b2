//! Route handlers for the HTTP surface table in SPEC_FULL.md §6. Thin:
//! every handler decodes its request, delegates to `igni_core`, and
//! serializes the result. The segment build pipeline itself lives in
//! `igni_core::build`.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use igni_core::{ApiError, PixFmt, SegmentTarget};
use igni_expr::SourceId;

use crate::auth::AuthTenant;
use crate::dto::{
    FrameRenderRequest, OkResponse, PartBlockRequest, PartPushRequest, SourceCreateRequest, SourceDescriptorResponse,
    SpecCreateRequest, SpecDescriptorResponse, StatusIdResponse,
};
use crate::state::ServerState;

pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, format!("igni/{}", env!("CARGO_PKG_VERSION")))
}

pub async fn create_source(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Json(body): Json<SourceCreateRequest>,
) -> Result<Json<StatusIdResponse>, ApiError> {
    let source_id = SourceId(uuid::Uuid::new_v4().to_string());
    state.app.register_source(
        tenant,
        source_id.clone(),
        &body.storage_service,
        &body.storage_config,
        &body.location,
        body.stream_idx,
    )?;
    Ok(Json(StatusIdResponse {
        status: "ok",
        id: source_id.0,
    }))
}

pub async fn get_source(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(id): Path<String>,
) -> Result<Json<SourceDescriptorResponse>, ApiError> {
    let handle = state.app.get_source(&tenant, &SourceId(id))?;
    Ok(Json(SourceDescriptorResponse {
        id: handle.id.0.clone(),
        width: handle.width,
        height: handle.height,
        pix_fmt: handle.pix_fmt.clone(),
        ts: handle
            .ts
            .iter()
            .map(|e| (e.pts.numerator(), e.pts.denominator(), e.is_keyframe))
            .collect(),
    }))
}

pub async fn create_spec(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Json(body): Json<SpecCreateRequest>,
) -> Result<Json<StatusIdResponse>, ApiError> {
    let segment_length = igni_expr::Rational::new(body.vod_segment_length[0], body.vod_segment_length[1]);
    let frame_rate = igni_expr::Rational::new(body.frame_rate[0], body.frame_rate[1]);
    let id = state.app.create_spec(
        tenant,
        body.width,
        body.height,
        body.pix_fmt,
        segment_length,
        frame_rate,
        body.ready_hook,
        body.steer_hook,
        Duration::from_secs(state.config.spec_expiry_secs),
    );
    Ok(Json(StatusIdResponse {
        status: "ok",
        id: id.to_string(),
    }))
}

fn spec_id_from_path(raw: &str) -> Result<igni_core::SpecId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(format!("spec {raw}")))
}

pub async fn get_spec(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(raw_id): Path<String>,
) -> Result<Json<SpecDescriptorResponse>, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    let entry = state.app.get_spec(&tenant, id)?;
    let guard = entry.state.lock();
    Ok(Json(SpecDescriptorResponse {
        id: entry.descriptor.id.to_string(),
        width: entry.descriptor.width,
        height: entry.descriptor.height,
        pix_fmt: entry.descriptor.pix_fmt.clone(),
        frames_applied: guard.committed_frames(),
        terminated: guard.terminal_pos().is_some(),
        closed: guard.closed(),
        vod_endpoint: format!("/vod/{}/playlist.m3u8", entry.descriptor.id),
    }))
}

pub async fn push_part(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(raw_id): Path<String>,
    Json(body): Json<PartPushRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    state.app.push_part(&tenant, id, body.pos, body.frames, body.terminal)?;
    Ok(Json(OkResponse::default()))
}

/// A part-block submission carries one compact-block envelope per part; the
/// wire form's `blocks` array exists for future chunked transfer but this
/// endpoint only accepts a single entry per call today.
pub async fn push_part_block(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(raw_id): Path<String>,
    Json(body): Json<PartBlockRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    let block = body
        .blocks
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("part_block request carried no blocks".to_string()))?;
    let bytes = BASE64
        .decode(block.body.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("malformed base64 block body: {e}")))?;
    let gzip = block.compression.as_deref() == Some("gzip");
    state.app.push_part_block(&tenant, id, body.pos, body.terminal, &bytes, gzip)?;
    Ok(Json(OkResponse::default()))
}

pub async fn render_frame(
    State(state): State<ServerState>,
    AuthTenant(_tenant): AuthTenant,
    Json(body): Json<FrameRenderRequest>,
) -> Result<Bytes, ApiError> {
    let raw = BASE64
        .decode(body.block.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("malformed base64 block body: {e}")))?;
    let gzip = body.compression.as_deref() == Some("gzip");
    let mut exprs = igni_expr::decode_compact(&raw, gzip)?;
    let root = exprs
        .pop()
        .ok_or_else(|| ApiError::BadRequest("empty frame block".to_string()))?;

    let pix_fmt = PixFmt::from_str_lossy(&body.pix_fmt)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown pix_fmt {}", body.pix_fmt)))?;
    let cancelled = AtomicBool::new(false);
    let frame = igni_core::render_single_frame(
        &root,
        body.width,
        body.height,
        pix_fmt,
        &state.app.sources,
        state.config.decode_workers,
        state.config.filter_workers,
        &cancelled,
    )?;
    Ok(Bytes::from(frame.data))
}

pub async fn playlist(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    state.app.get_spec(&tenant, id)?;
    let text = igni_core::playlist::render_master_playlist();
    Ok(([(axum::http::header::CONTENT_TYPE, "application/vnd.apple.mpegurl")], text))
}

pub async fn stream_playlist(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    let entry = state.app.get_spec(&tenant, id)?;
    let text = igni_core::playlist::render_media_playlist(&entry.descriptor, &entry.state.lock());
    Ok(([(axum::http::header::CONTENT_TYPE, "application/vnd.apple.mpegurl")], text))
}

pub async fn status(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path(raw_id): Path<String>,
) -> Result<Json<igni_core::playlist::SpecStatus>, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    let entry = state.app.get_spec(&tenant, id)?;
    let segment_frames = entry.descriptor.segment_frames();
    let out = igni_core::playlist::status_of(&entry.state.lock(), segment_frames);
    Ok(Json(out))
}

pub async fn segment(
    State(state): State<ServerState>,
    AuthTenant(tenant): AuthTenant,
    Path((raw_id, k)): Path<(String, u64)>,
) -> Response {
    match segment_inner(state, tenant, raw_id, k).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn segment_inner(
    state: ServerState,
    tenant: igni_core::TenantId,
    raw_id: String,
    k: u64,
) -> Result<Response, ApiError> {
    let id = spec_id_from_path(&raw_id)?;
    let entry = state.app.get_spec(&tenant, id)?;
    let segment_frames = entry.descriptor.segment_frames();
    let ready = {
        let guard = entry.state.lock();
        igni_core::playlist::ready_segment_count(&guard, segment_frames)
    };
    if k >= ready {
        return Err(ApiError::NotFound(format!("segment {k} of spec {id}")));
    }

    let cell = state.app.segment_cell(id, k);
    let pix_fmt = PixFmt::from_str_lossy(&entry.descriptor.pix_fmt)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown pix_fmt {}", entry.descriptor.pix_fmt)))?;
    let deadline = Duration::from_secs_f64(entry.descriptor.segment_length.to_f64() * state.config.segment_build_safety_factor);

    // `get_or_init`, not `get_or_try_init`: the cell's value type already is
    // `Result<Bytes, CachedBuildError>`, so an error result is itself the
    // cached value rather than an init failure that would leave the cell empty.
    let result = cell
        .get_or_init(|| async {
            let start = k * segment_frames;
            let end = start + segment_frames;
            let roots = entry.state.lock().frames_in(start, end);
            let target = SegmentTarget {
                width: entry.descriptor.width,
                height: entry.descriptor.height,
                pix_fmt,
                frame_rate: entry.descriptor.frame_rate,
                encoder_binary: state.config.encoder_binary.clone(),
                encoder_args: state.config.encoder_args.clone(),
            };
            let sources = state.app.sources.clone();
            let decode_workers = state.config.decode_workers;
            let filter_workers = state.config.filter_workers;
            let build = tokio::task::spawn_blocking(move || {
                let cancelled = AtomicBool::new(false);
                igni_core::build_segment(&roots, &target, &sources, decode_workers, filter_workers, &cancelled)
            });
            match tokio::time::timeout(deadline, build).await {
                Ok(Ok(Ok(bytes))) => Ok(bytes),
                Ok(Ok(Err(e))) => Err(igni_core::CachedBuildError::from(e)),
                Ok(Err(_join)) => Err(igni_core::CachedBuildError::from(igni_core::BuildError::Cancelled)),
                Err(_elapsed) => Err(igni_core::CachedBuildError::from(igni_core::BuildError::Timeout)),
            }
        })
        .await
        .clone();

    match result {
        Ok(bytes) => Ok(([(axum::http::header::CONTENT_TYPE, "video/mp2t")], bytes).into_response()),
        Err(cached) => Ok(cached.into_response()),
    }
}
