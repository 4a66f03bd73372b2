//! Shared axum router state: the process-wide registries plus everything a
//! handler needs to invoke the segment build pipeline.

use std::sync::Arc;

use igni_config::Configuration;
use igni_core::{AppState, TokenResolver};

#[derive(Clone)]
pub struct ServerState {
    pub app: Arc<AppState>,
    pub config: Arc<Configuration>,
    pub token_resolver: TokenResolver,
}
