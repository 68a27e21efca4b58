//! src/app.rs
//!
//! `App` owns the console's configuration, links the device transport, the
//! protocol engine and the optional UI bridge with channels, and tears them
//! down together.

use crate::{
    api::ApiServer,
    config::Config,
    domain::{Action, EngineView, Notice, TransportCommand, TransportEvent},
    engine::{Engine, EngineService},
    error::Result,
    transport::{ReconnectPolicy, Transport},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// A configured console, ready to run.
pub struct App {
    config: Config,
    shutdown_token: CancellationToken,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Builds an `App` from `console.toml` and `CONSOLE_*` variables.
    pub fn load() -> Result<Self> {
        Self::new(Config::load()?)
    }

    /// A handle that stops every service when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the transport, the engine and (if configured) the console bridge
    /// until Ctrl+C or the shutdown token fires, then waits for each to exit.
    pub async fn run(self) -> Result<()> {
        tracing::info!(device_url = %self.config.device_url, "🚲 Starting collector console...");

        // transport <-> engine <-> console
        let (transport_command_tx, transport_command_rx) = mpsc::channel::<TransportCommand>(100);
        let (transport_event_tx, transport_event_rx) = mpsc::channel::<TransportEvent>(100);
        let (action_tx, action_rx) = mpsc::channel::<Action>(32);
        let (view_tx, view_rx) = watch::channel(EngineView::default());
        let (notice_tx, _) = broadcast::channel::<Notice>(64);

        // Bound before anything is spawned: a taken port is fatal at startup.
        let api_server = match &self.config.console {
            Some(console) => {
                let server =
                    ApiServer::bind(console.bind_addr, view_rx, notice_tx.clone(), action_tx)
                        .await?;
                tracing::info!(bind_addr = %console.bind_addr, "Console bridge enabled.");
                Some(server)
            }
            None => None,
        };

        let transport = Transport::new(
            self.config.device_url.clone(),
            ReconnectPolicy::from_config(&self.config),
            transport_command_rx,
            transport_event_tx,
        )?;
        let transport_task = tokio::spawn(transport.run(self.shutdown_token.clone()));
        tracing::debug!("Device link task spawned.");

        let engine = EngineService::new(
            Engine::from_config(&self.config),
            self.config.transition_timeout(),
            transport_event_rx,
            action_rx,
            transport_command_tx,
            view_tx,
            notice_tx.clone(),
        );
        let engine_task = tokio::spawn(engine.run(self.shutdown_token.clone()));
        tracing::debug!("Protocol engine task spawned.");

        let api_task = api_server.map(|server| {
            let shutdown_token = self.shutdown_token.clone();
            tokio::spawn(async move {
                let result = server.run(shutdown_token.clone()).await;
                if result.is_err() {
                    shutdown_token.cancel();
                }
                result
            })
        });

        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("Ctrl+C received. Initiating graceful shutdown..."),
                        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
                    }
                    shutdown_token.cancel();
                }
                _ = shutdown_token.cancelled() => {}
            }
        });

        self.shutdown_token.cancelled().await;

        transport_task.await?;
        engine_task.await?;
        if let Some(task) = api_task {
            if let Err(e) = task.await? {
                tracing::error!(error = %e, "API server failed");
                return Err(e);
            }
        }
        tracing::info!("👋 Console has shut down gracefully.");

        Ok(())
    }
}
