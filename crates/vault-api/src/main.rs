//! File vault server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p vault-api --bin filevault
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use tracing::{error, info};
use vault_common::{try_init_tracing_with_config, AppConfig, Environment, TracingConfig};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Tracing preset follows APP_ENV before the full config is parsed
    let env = std::env::var("APP_ENV")
        .ok()
        .and_then(|value| Environment::parse(&value))
        .unwrap_or_default();
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting file vault server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.api.port,
        required_channels = config.channels.required.len(),
        "Configuration loaded"
    );

    vault_api::run(config).await?;

    Ok(())
}
