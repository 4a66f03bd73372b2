//! Process-wide state: the source registry (with tenant ownership), the
//! spec map, and the segment-build memoization cache. Mirrors the shape of
//! `av1an_core::context::Av1anContext`'s process-wide `DashMap`s — here a
//! `DashMap<SpecId, ...>` plays the "process-wide concurrent map of
//! independent per-key state" role for specs that `DoneJson::done` plays
//! for per-chunk completion records.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use igni_expr::{FrameExpr, Rational, SourceId};
use igni_source::{SourceHandle, SourceRegistry};
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::{ApiError, CachedBuildError};
use crate::ids::{SpecId, TenantId};
use crate::spec::{SpecDescriptor, SpecState};

pub struct SpecEntry {
    pub descriptor: SpecDescriptor,
    pub state: Mutex<SpecState>,
}

type SegmentCell = Arc<OnceCell<Result<bytes::Bytes, CachedBuildError>>>;

/// Everything a request handler needs: source/spec registries plus the
/// per-segment build memoization table.
pub struct AppState {
    pub sources: Arc<SourceRegistry>,
    source_tenants: DashMap<SourceId, TenantId>,
    specs: DashMap<SpecId, Arc<SpecEntry>>,
    segment_cache: DashMap<(SpecId, u64), SegmentCell>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            sources: Arc::new(SourceRegistry::new()),
            source_tenants: DashMap::new(),
            specs: DashMap::new(),
            segment_cache: DashMap::new(),
        }
    }

    pub fn register_source(
        &self,
        tenant: TenantId,
        source_id: SourceId,
        storage_service: &str,
        storage_config: &HashMap<String, String>,
        location: &str,
        stream_index: u32,
    ) -> Result<Arc<SourceHandle>, ApiError> {
        let handle = self
            .sources
            .register(source_id.clone(), storage_service, storage_config, location, stream_index)
            .map_err(ApiError::SourceOpen)?;
        self.source_tenants.entry(source_id).or_insert(tenant);
        Ok(handle)
    }

    /// Returns the handle only if it belongs to `tenant`; a mismatch is
    /// reported as `NotFound` rather than `Unauthorized` so existence of
    /// another tenant's source is never leaked.
    pub fn get_source(&self, tenant: &TenantId, source_id: &SourceId) -> Result<Arc<SourceHandle>, ApiError> {
        let owner = self
            .source_tenants
            .get(source_id)
            .ok_or_else(|| ApiError::NotFound(format!("source {source_id}")))?;
        if &*owner != tenant {
            return Err(ApiError::NotFound(format!("source {source_id}")));
        }
        self.sources
            .get(source_id)
            .ok_or_else(|| ApiError::NotFound(format!("source {source_id}")))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_spec(
        &self,
        tenant: TenantId,
        width: u32,
        height: u32,
        pix_fmt: String,
        segment_length: Rational,
        frame_rate: Rational,
        ready_hook: Option<String>,
        steer_hook: Option<String>,
        ttl: Duration,
    ) -> SpecId {
        let id = SpecId::new();
        let now = SystemTime::now();
        let descriptor = SpecDescriptor {
            id,
            tenant,
            width,
            height,
            pix_fmt,
            segment_length,
            frame_rate,
            ready_hook,
            steer_hook,
            created_at: now,
            expires_at: now + ttl,
        };
        self.specs.insert(
            id,
            Arc::new(SpecEntry {
                descriptor,
                state: Mutex::new(SpecState::new()),
            }),
        );
        id
    }

    pub fn get_spec(&self, tenant: &TenantId, id: SpecId) -> Result<Arc<SpecEntry>, ApiError> {
        let entry = self
            .specs
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| ApiError::NotFound(format!("spec {id}")))?;
        if &entry.descriptor.tenant != tenant {
            return Err(ApiError::NotFound(format!("spec {id}")));
        }
        Ok(entry)
    }

    /// `push_part` (SPEC_FULL.md §4.7). Validates every root against the
    /// filter registry and the source registry's `ILoc` range before
    /// touching the spec's state, so a malformed expression is rejected as
    /// `ApiError::Decode` (400) at push time rather than surfacing as a
    /// `RenderError` 500 much later at segment build. Invalidates any
    /// memoized segment cells whose frame range the new part could affect,
    /// so a later fetch rebuilds with the newly-committed frames rather
    /// than serving a stale cached failure from before the frontier
    /// advanced.
    pub fn push_part(
        &self,
        tenant: &TenantId,
        id: SpecId,
        pos: u64,
        frames: Vec<(Rational, FrameExpr)>,
        terminal: bool,
    ) -> Result<(), ApiError> {
        let entry = self.get_spec(tenant, id)?;
        for (_, expr) in &frames {
            igni_expr::validate(expr, self.sources.as_ref())?;
        }
        entry.state.lock().push_part(pos, frames, terminal).map_err(ApiError::StateViolation)?;
        self.segment_cache.retain(|(spec_id, _), _| *spec_id != id);
        Ok(())
    }

    /// Decodes a `CompactBlock` submission and delegates to the same
    /// `push_part` transition used by the nested-JSON path, per
    /// SPEC_FULL.md §4.7 ("both wire forms share one state-machine code
    /// path"). Per-frame `ts` isn't carried in the compact block wire
    /// form, so it's synthesized from the spec's frame rate: frame `pos+i`
    /// gets `ts = (pos+i) / frame_rate`, keeping the monotonicity
    /// invariant trivially satisfied.
    pub fn push_part_block(
        &self,
        tenant: &TenantId,
        id: SpecId,
        pos: u64,
        terminal: bool,
        block_bytes: &[u8],
        gzip: bool,
    ) -> Result<(), ApiError> {
        let entry = self.get_spec(tenant, id)?;
        let exprs = igni_expr::decode_compact(block_bytes, gzip)?;
        for expr in &exprs {
            igni_expr::validate(expr, self.sources.as_ref())?;
        }
        let frame_rate = entry.descriptor.frame_rate;
        let frames = exprs
            .into_iter()
            .enumerate()
            .map(|(i, expr)| (Rational::new(pos as i64 + i as i64, 1) / frame_rate, expr))
            .collect();
        entry
            .state
            .lock()
            .push_part(pos, frames, terminal)
            .map_err(ApiError::StateViolation)?;
        self.segment_cache.retain(|(spec_id, _), _| *spec_id != id);
        Ok(())
    }

    /// Returns the memoization cell for `(spec, segment)`, creating it if
    /// absent. Concurrent callers for the same segment await the same
    /// `OnceCell`; a build that errors leaves its result cached (so
    /// repeated requests for a genuinely bad segment don't re-decode) but
    /// is evicted the next time the spec's state changes via
    /// [`Self::push_part`]/[`Self::push_part_block`].
    pub fn segment_cell(&self, id: SpecId, k: u64) -> SegmentCell {
        self.segment_cache.entry((id, k)).or_insert_with(|| Arc::new(OnceCell::new())).clone()
    }

    /// Sweeps specs whose `expires_at` has passed, dropping their state and
    /// any cached segment cells. Returns the number reaped, for logging.
    pub fn reap_expired(&self, now: SystemTime) -> usize {
        let expired: Vec<SpecId> = self
            .specs
            .iter()
            .filter(|entry| entry.value().descriptor.expires_at < now)
            .map(|entry| *entry.key())
            .collect();
        for id in &expired {
            self.specs.remove(id);
            self.segment_cache.retain(|(spec_id, _), _| spec_id != id);
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lookup_respects_tenant_ownership() {
        let state = AppState::new();
        let owner = TenantId("acme".into());
        let id = state.create_spec(
            owner.clone(),
            1280,
            720,
            "yuv420p".into(),
            Rational::new(2, 1),
            Rational::new(30, 1),
            None,
            None,
            Duration::from_secs(3600),
        );
        assert!(state.get_spec(&owner, id).is_ok());
        let other = TenantId("other".into());
        assert!(state.get_spec(&other, id).is_err());
    }
}
