//! src/engine/mod.rs
//!
//! Defines the `EngineService`, the actor that owns the protocol [`Engine`]
//! and connects it to the transport and the presentation layer.

use crate::domain::{Action, EngineView, Notice, TransportCommand, TransportEvent};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

pub mod collectors;
pub mod outbox;
pub mod phase;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod transition;

pub use self::protocol::Engine;

/// The protocol engine actor.
pub struct EngineService {
    engine: Engine,
    transition_timeout: Option<Duration>,
    transition_deadline: Option<Instant>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    action_rx: mpsc::Receiver<Action>,
    transport_tx: mpsc::Sender<TransportCommand>,
    view_tx: watch::Sender<EngineView>,
    notice_tx: broadcast::Sender<Notice>,
}

impl EngineService {
    pub fn new(
        engine: Engine,
        transition_timeout: Option<Duration>,
        transport_rx: mpsc::Receiver<TransportEvent>,
        action_rx: mpsc::Receiver<Action>,
        transport_tx: mpsc::Sender<TransportCommand>,
        view_tx: watch::Sender<EngineView>,
        notice_tx: broadcast::Sender<Notice>,
    ) -> Self {
        Self {
            engine,
            transition_timeout,
            transition_deadline: None,
            transport_rx,
            action_rx,
            transport_tx,
            view_tx,
            notice_tx,
        }
    }

    pub async fn run(mut self, shutdown_token: CancellationToken) {
        tracing::info!("Engine service started");
        self.publish().await;

        loop {
            let deadline = self.transition_deadline;
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    tracing::info!("Engine service received shutdown signal.");
                    break;
                },
                Some(event) = self.transport_rx.recv() => {
                    match event {
                        TransportEvent::Phase(phase) => self.engine.on_phase_changed(phase),
                        TransportEvent::Text(text) => self.engine.on_text(&text),
                    }
                },
                Some(action) = self.action_rx.recv() => {
                    tracing::debug!(?action, "Presentation action");
                    if let Err(e) = self.engine.dispatch(action) {
                        tracing::warn!(error = %e, "Action was not carried out");
                    }
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.engine.expire_transition();
                },
                else => {
                    tracing::info!("Channels closed. Engine service shutting down.");
                    break;
                }
            }
            self.track_transition_deadline();
            self.publish().await;
        }
    }

    fn track_transition_deadline(&mut self) {
        match (self.engine.transitioning(), self.transition_deadline) {
            (true, None) => {
                self.transition_deadline = self.transition_timeout.map(|t| Instant::now() + t);
            }
            (false, Some(_)) => self.transition_deadline = None,
            _ => {}
        }
    }

    /// Forwards queued commands and notices, then publishes the view if it changed.
    async fn publish(&mut self) {
        for text in self.engine.drain_outbound() {
            if let Err(e) = self.transport_tx.send(TransportCommand::Send(text)).await {
                tracing::error!(error = %e, "Failed to send command to transport service");
            }
        }
        for notice in self.engine.drain_notices() {
            tracing::info!(%notice, "Notice");
            // No subscribers is fine: nobody is looking at the console.
            let _ = self.notice_tx.send(notice);
        }
        let view = self.engine.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}
