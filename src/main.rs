//! turnstile: a file server that shuts out clients who hammer it.
//! Used by: binary entrypoint.

pub mod access;
pub mod admin;
pub mod config;
pub mod console;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;
pub mod storage;
pub mod telemetry;

use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path =
        std::env::var("TURNSTILE_CONFIG").unwrap_or_else(|_| config::DEFAULT_PATH.into());
    let config = config::Config::load(&config_path)?;
    let _log_guard = logging::init(&config.log_dir)?;

    if Path::new(&config_path).exists() {
        tracing::info!(path = %config_path, "configuration loaded");
    } else {
        tracing::warn!(path = %config_path, "config file not found, using defaults");
    }

    console::print_banner();
    console::print_startup(&config);

    let addr = config.address.clone();
    let state = state::build_state(config);
    tracing::info!("starting turnstile on {}", addr);

    server::run(state, &addr).await?;
    Ok(())
}
