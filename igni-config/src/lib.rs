//! Runtime configuration for the `igni` server.
//!
//! Mirrors the shape of `av1an-core`'s `Configuration`: a plain struct with a
//! `Default` impl covering every field, optionally overridden by a TOML file
//! on disk and then by CLI flags in the binary crate.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Multiplier applied to a spec's `segment_length` to derive the deadline
/// passed to `tokio::time::timeout` around a segment build.
pub const SAFETY_FACTOR: f64 = 8.0;

/// Server-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Address the HTTP server binds to, default: `0.0.0.0`.
    pub address: String,
    /// Port used by the HTTP server, default: `8080`.
    pub port: u16,
    /// Bearer token to tenant-id map. The real account system is out of
    /// scope (SPEC_FULL.md §6); this is the static default resolver.
    pub tokens: HashMap<String, String>,
    /// Number of source-decoding worker threads per segment build, default: `4`.
    pub decode_workers: usize,
    /// Number of filter-evaluation worker threads per segment build, default: `4`.
    pub filter_workers: usize,
    /// Safety factor applied to `segment_length` to derive a build deadline, default: `8.0`.
    pub segment_build_safety_factor: f64,
    /// Encoder binary invoked by `igni-mux` for each segment, default: `ffmpeg`.
    pub encoder_binary: String,
    /// Extra encoder CLI args appended after the forced codec/timebase args.
    pub encoder_args: Vec<String>,
    /// How long an unterminated spec may sit idle before being reaped, in seconds.
    pub spec_expiry_secs: u64,
    /// Interval between spec-expiry reaper sweeps, in seconds.
    pub reaper_interval_secs: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            address: "0.0.0.0".to_string(),
            port: 8080,
            tokens: HashMap::new(),
            decode_workers: 4,
            filter_workers: 4,
            segment_build_safety_factor: SAFETY_FACTOR,
            encoder_binary: "ffmpeg".to_string(),
            encoder_args: Vec::new(),
            spec_expiry_secs: 24 * 60 * 60,
            reaper_interval_secs: 60,
        }
    }
}

impl Display for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address: '{}', port: '{}', decode_workers: '{}', filter_workers: '{}'\n\
             segment_build_safety_factor: '{}', encoder: '{} {:?}'\n\
             spec_expiry_secs: '{}', reaper_interval_secs: '{}'",
            self.address,
            self.port,
            self.decode_workers,
            self.filter_workers,
            self.segment_build_safety_factor,
            self.encoder_binary,
            self.encoder_args,
            self.spec_expiry_secs,
            self.reaper_interval_secs,
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl Configuration {
    /// Load configuration from a TOML file, falling back to defaults for any
    /// field the file doesn't set.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let text = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sane() {
        let cfg = Configuration::default();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.decode_workers > 0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Configuration = toml::from_str("port = 9000\n").unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.address, Configuration::default().address);
    }
}
