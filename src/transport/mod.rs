//! src/transport/mod.rs
//!
//! Defines the `Transport` service, which owns the WebSocket link to the
//! device orchestrator. It reports connection phases and inbound text frames
//! to the engine, writes outbound frames while the link is open, and
//! reconnects with exponential backoff when the link drops.

use crate::{
    config::Config,
    domain::{ConnectionPhase, TransportCommand, TransportEvent},
    error::{Error, Result},
    transport::connection::Disconnect,
};
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_util::sync::CancellationToken;

pub mod connection;

/// Exponential backoff settings for reconnection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl ReconnectPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.reconnect_initial_ms),
            max_delay: Duration::from_millis(config.reconnect_max_ms),
            max_retries: config.reconnect_max_retries,
        }
    }

    /// `min(initial * 2^attempt, max)`, spread by up to ±25%.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * 2f64.powi(attempt.min(31) as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_secs_f64(capped * jitter)
    }
}

/// The device link actor.
pub struct Transport {
    url: String,
    policy: ReconnectPolicy,
    command_rx: mpsc::Receiver<TransportCommand>,
    event_tx: mpsc::Sender<TransportEvent>,
}

impl Transport {
    pub fn new(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        command_rx: mpsc::Receiver<TransportCommand>,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let url = url.into();
        url.as_str()
            .into_client_request()
            .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self {
            url,
            policy,
            command_rx,
            event_tx,
        })
    }

    /// The main run loop for the `Transport` service.
    pub async fn run(mut self, shutdown_token: CancellationToken) {
        tracing::info!(url = %self.url, "Transport service started");
        let mut attempt: u32 = 0;

        loop {
            self.emit(ConnectionPhase::Connecting).await;
            let connected = tokio::select! {
                biased;
                _ = shutdown_token.cancelled() => break,
                result = connection::connect(&self.url) => result,
            };

            match connected {
                Ok(stream) => {
                    attempt = 0;
                    tracing::info!(url = %self.url, "Connected to device");
                    self.emit(ConnectionPhase::Open).await;
                    let outcome = connection::drive(
                        stream,
                        &mut self.command_rx,
                        &self.event_tx,
                        &shutdown_token,
                    )
                    .await;
                    match outcome {
                        Disconnect::Shutdown => {
                            self.emit(ConnectionPhase::Closing).await;
                            self.emit(ConnectionPhase::Closed).await;
                            break;
                        }
                        Disconnect::ClosedByDevice => {
                            tracing::info!("Device closed the connection");
                            self.emit(ConnectionPhase::Closing).await;
                            self.emit(ConnectionPhase::Closed).await;
                        }
                        Disconnect::Failed(e) => {
                            tracing::warn!(error = %e, "Connection to device lost");
                            self.emit(ConnectionPhase::Closed).await;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Failed to connect to device");
                    self.emit(ConnectionPhase::Closed).await;
                }
            }

            if let Some(max) = self.policy.max_retries {
                if attempt >= max {
                    tracing::error!(max_retries = max, "Reconnection limit reached, giving up");
                    break;
                }
            }

            let delay = self.policy.delay(attempt);
            tracing::info!(delay_ms = delay.as_millis() as u64, attempt, "Waiting before reconnect");
            if !self.wait(delay, &shutdown_token).await {
                break;
            }
            attempt += 1;
        }
        tracing::info!("Transport service stopped");
    }

    /// Sleeps for `delay`, dropping any command that arrives meanwhile.
    /// Returns `false` if shutdown was requested.
    async fn wait(&mut self, delay: Duration, shutdown_token: &CancellationToken) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_token.cancelled() => return false,
                _ = &mut sleep => return true,
                Some(TransportCommand::Send(_)) = self.command_rx.recv() => {
                    tracing::warn!("Link is down. Dropping outbound frame.");
                }
            }
        }
    }

    async fn emit(&self, phase: ConnectionPhase) {
        if self.event_tx.send(TransportEvent::Phase(phase)).await.is_err() {
            tracing::debug!(?phase, "Engine is gone. Phase change not delivered.");
        }
    }
}
