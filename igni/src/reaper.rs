//! Background spec-expiry sweep: a `tokio::spawn`ed loop on a
//! `tokio::time::interval`, the async equivalent of a periodic thread that
//! never blocks (SPEC_FULL.md §5).

use std::time::{Duration, SystemTime};

use crate::state::ServerState;

pub fn spawn(state: ServerState, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reaped = state.app.reap_expired(SystemTime::now());
            if reaped > 0 {
                tracing::info!(reaped, "swept expired specs");
            }
        }
    });
}
