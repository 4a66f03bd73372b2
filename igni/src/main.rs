//! `igni` binary entry point: CLI parsing, logging setup, and the axum HTTP
//! server wiring. Panic hook pattern mirrors `av1an-cli`'s `main`, which
//! installs a hook logging panics through `tracing` instead of letting them
//! print to stderr unformatted.

mod auth;
mod cli;
mod dto;
mod reaper;
mod routes;
mod state;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use igni_core::{static_resolver, AppState, TenantId};
use tower_http::trace::TraceLayer;

use cli::{CliOpts, Command};
use state::ServerState;

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("{}", info);
        default_hook(info);
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = CliOpts::parse();
    let Command::Server {
        config,
        address,
        port,
        log_level,
        log_file,
    } = opts.command;

    let mut configuration = match &config {
        Some(path) => igni_config::Configuration::from_toml_file(path)?,
        None => igni_config::Configuration::default(),
    };
    if let Some(address) = address {
        configuration.address = address;
    }
    if let Some(port) = port {
        configuration.port = port;
    }

    igni_logging::init_logging(log_level, log_file, igni_logging::DEFAULT_FILE_LEVEL);
    install_panic_hook();
    tracing::info!(%configuration, "starting igni");

    let tokens: HashMap<String, TenantId> = configuration
        .tokens
        .iter()
        .map(|(token, tenant)| (token.clone(), TenantId(tenant.clone())))
        .collect();

    let server_state = ServerState {
        app: Arc::new(AppState::new()),
        config: Arc::new(configuration.clone()),
        token_resolver: static_resolver(tokens),
    };

    reaper::spawn(server_state.clone(), Duration::from_secs(configuration.reaper_interval_secs));

    let app = Router::new()
        .route("/", get(routes::root))
        .route("/v2/source", post(routes::create_source))
        .route("/v2/source/{id}", get(routes::get_source))
        .route("/v2/spec", post(routes::create_spec))
        .route("/v2/spec/{id}", get(routes::get_spec))
        .route("/v2/spec/{id}/part", post(routes::push_part))
        .route("/v2/spec/{id}/part_block", post(routes::push_part_block))
        .route("/v2/frame", post(routes::render_frame))
        .route("/vod/{id}/playlist.m3u8", get(routes::playlist))
        .route("/vod/{id}/stream.m3u8", get(routes::stream_playlist))
        .route("/vod/{id}/segment-{k}.ts", get(routes::segment))
        .route("/vod/{id}/status", get(routes::status))
        .layer(TraceLayer::new_for_http())
        .with_state(server_state);

    let addr: SocketAddr = format!("{}:{}", configuration.address, configuration.port).parse()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
