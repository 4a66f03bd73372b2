//! Logging setup, layered the same way `av1an-core::logging` wires its
//! console + rolling file subscribers.

use std::collections::HashMap;
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

static WORKER_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

pub const DEFAULT_CONSOLE_LEVEL: LevelFilter = LevelFilter::INFO;
pub const DEFAULT_FILE_LEVEL: LevelFilter = LevelFilter::DEBUG;

#[derive(Debug, Clone)]
struct ModuleConfig {
    console_level: LevelFilter,
    file_level: LevelFilter,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            console_level: DEFAULT_CONSOLE_LEVEL,
            file_level: DEFAULT_FILE_LEVEL,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// `console_level` governs stderr output; `log_path` is the rolling log
/// file's target path; `RUST_LOG` entries of the form `module=level`
/// override either, per module, the same way the teacher's logging setup
/// allows environment overrides.
pub fn init_logging(console_level: LevelFilter, log_path: PathBuf, file_level: LevelFilter) {
    let mut module_configs = HashMap::new();
    for module in ["igni", "igni_core", "igni_decode", "igni_filter", "igni_mux"] {
        module_configs.insert(
            module,
            ModuleConfig {
                console_level,
                file_level,
            },
        );
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        for directive in rust_log.split(',') {
            if let Some((module, level)) = directive.split_once('=') {
                if let (Some(config), Ok(level)) =
                    (module_configs.get_mut(module), level.parse::<LevelFilter>())
                {
                    config.console_level = level;
                    config.file_level = level;
                }
            }
        }
    }

    let build_filter = |pick: fn(&ModuleConfig) -> LevelFilter| -> EnvFilter {
        let mut filter = String::new();
        for (module, config) in &module_configs {
            if !filter.is_empty() {
                filter.push(',');
            }
            filter.push_str(&format!("{module}={}", pick(config)));
        }
        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console_filter = build_filter(|c| c.console_level);
    let file_filter = build_filter(|c| c.file_level);

    let parent = log_path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = log_path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "igni.log".into());
    let file_appender = RollingFileAppender::new(Rotation::DAILY, parent, file_name);

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = WORKER_GUARD.set(guard);

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(non_blocking)
                .with_filter(file_filter),
        )
        .with(
            fmt::layer()
                .compact()
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .with_file(false)
                .without_time()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already set");
    }

    tracing::debug!("logging initialized");
}
