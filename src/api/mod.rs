//! src/api/mod.rs
//!
//! Defines the `ApiServer` service, which serves the console UI and bridges it
//! to the engine: views and notices flow out over a WebSocket, actions flow in.

use crate::domain::{Action, EngineView, Notice};
use axum::{extract::State, routing::get, Json, Router};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc, watch},
};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

pub mod protocol;
pub mod ws;

/// The shared state accessible by all Axum handlers.
#[derive(Clone)]
pub struct ApiState {
    pub view_rx: watch::Receiver<EngineView>,
    pub notice_tx: broadcast::Sender<Notice>,
    pub action_tx: mpsc::Sender<Action>,
}

pub struct ApiServer {
    listener: TcpListener,
    state: ApiState,
}

impl ApiServer {
    /// Binds the listener up front so a taken port fails startup.
    pub async fn bind(
        bind_addr: std::net::SocketAddr,
        view_rx: watch::Receiver<EngineView>,
        notice_tx: broadcast::Sender<Notice>,
        action_tx: mpsc::Sender<Action>,
    ) -> crate::error::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self {
            listener,
            state: ApiState {
                view_rx,
                notice_tx,
                action_tx,
            },
        })
    }

    pub fn router(state: ApiState) -> Router {
        Router::new()
            .route("/ws", get(ws::websocket_handler))
            .route("/state", get(current_view))
            .fallback_service(ServeDir::new("dist"))
            .with_state(state)
    }

    pub async fn run(self, shutdown_token: CancellationToken) -> crate::error::Result<()> {
        let app = Self::router(self.state);

        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(listen_addr = %addr, "API server listening");
        }

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                tracing::info!("API server received shutdown signal.");
            })
            .await?;

        Ok(())
    }
}

async fn current_view(State(state): State<ApiState>) -> Json<EngineView> {
    Json(state.view_rx.borrow().clone())
}
