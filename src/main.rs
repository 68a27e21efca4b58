//! src/main.rs
//!
//! The entrypoint for the collector console binary. It sets up logging,
//! loads configuration and hands over to [`App`].

use anyhow::Context;
use collector_console::App;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG=debug` or `RUST_LOG=trace` for more detail.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = App::load().context("Failed to load configuration")?;
    app.run().await.context("Application failed to run")?;
    Ok(())
}
