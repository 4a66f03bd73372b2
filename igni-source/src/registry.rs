//! The process-wide source registry and probe cache (C2).
//!
//! Mirrors the shape of `av1an_core::context::Av1anContext`'s process-wide
//! `DashMap`s, but uses `parking_lot::RwLock<HashMap<..>>` instead since the
//! access pattern here is read-mostly (many concurrent `get`s, rare
//! `register`s) rather than the high-churn insert/remove `DashMap` is built
//! for.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use igni_expr::{Rational, SourceId};
use parking_lot::RwLock;

use crate::error::SourceError;
use crate::probe::{self, TsEntry};
use crate::storage;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeKey {
    pub storage_uri: String,
    pub stream_index: u32,
    pub content_size_hint: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceHandle {
    pub id: SourceId,
    pub path: std::path::PathBuf,
    pub stream_index: u32,
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub ts: Vec<TsEntry>,
}

impl SourceHandle {
    pub fn pts_at(&self, index: i64) -> Option<Rational> {
        let index = usize::try_from(index).ok()?;
        self.ts.get(index).map(|e| e.pts)
    }

    pub fn len(&self) -> usize {
        self.ts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ts.is_empty()
    }
}

#[derive(Default)]
pub struct SourceRegistry {
    by_id: RwLock<HashMap<SourceId, Arc<SourceHandle>>>,
    probe_cache: RwLock<HashMap<ProbeKey, Arc<SourceHandle>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or re-validates) a source. The probe is authoritative:
    /// a source id seen before must reprobe to the identical handle, or
    /// this is a hard error.
    pub fn register(
        &self,
        source_id: SourceId,
        storage_service: &str,
        storage_config: &HashMap<String, String>,
        location: &str,
        stream_index: u32,
    ) -> Result<Arc<SourceHandle>, SourceError> {
        let backend = storage::backend_for(storage_service, storage_config)?;
        let path = backend.resolve(location)?;
        let content_size_hint = fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|_| SourceError::NotFound(location.to_string()))?;

        let probe_key = ProbeKey {
            storage_uri: path.display().to_string(),
            stream_index,
            content_size_hint,
        };

        let handle = {
            let cached = self.probe_cache.read().get(&probe_key).cloned();
            match cached {
                Some(existing) => Arc::new(SourceHandle {
                    id: source_id.clone(),
                    ..(*existing).clone()
                }),
                None => {
                    let probed = probe::probe(&path)?;
                    let fresh = Arc::new(SourceHandle {
                        id: source_id.clone(),
                        path: path.clone(),
                        stream_index,
                        width: probed.width,
                        height: probed.height,
                        pix_fmt: probed.pix_fmt,
                        ts: probed.ts,
                    });
                    self.probe_cache.write().insert(probe_key, fresh.clone());
                    fresh
                }
            }
        };

        let mut by_id = self.by_id.write();
        match by_id.get(&source_id) {
            Some(existing) if existing.width != handle.width
                || existing.height != handle.height
                || existing.pix_fmt != handle.pix_fmt
                || existing.ts != handle.ts =>
            {
                Err(SourceError::ProbeMismatch {
                    source_id: source_id.to_string(),
                    storage_uri: path.display().to_string(),
                })
            }
            Some(existing) => Ok(existing.clone()),
            None => {
                by_id.insert(source_id, handle.clone());
                Ok(handle)
            }
        }
    }

    pub fn get(&self, source_id: &SourceId) -> Option<Arc<SourceHandle>> {
        self.by_id.read().get(source_id).cloned()
    }
}

impl igni_expr::SourceLookup for SourceRegistry {
    fn pts_at(&self, source: &SourceId, index: i64) -> Option<Rational> {
        self.get(source)?.pts_at(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_lookup_is_none() {
        let registry = SourceRegistry::new();
        assert!(registry.get(&SourceId("nope".into())).is_none());
    }
}
