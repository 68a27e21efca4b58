//! src/transport/connection.rs
//!
//! Handles a single WebSocket connection: establishing it, then pumping
//! frames in both directions until it ends.

use crate::{
    domain::{TransportCommand, TransportEvent},
    error::{Error, Result},
};
use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

pub type DeviceStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connection ended.
#[derive(Debug)]
pub enum Disconnect {
    /// Shutdown was requested, or the engine went away.
    Shutdown,
    ClosedByDevice,
    Failed(Error),
}

pub async fn connect(url: &str) -> Result<DeviceStream> {
    let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
    Ok(stream)
}

/// Forwards inbound text frames to the engine and outbound commands to the
/// device, in order, until the connection ends.
pub async fn drive(
    stream: DeviceStream,
    command_rx: &mut mpsc::Receiver<TransportCommand>,
    event_tx: &mpsc::Sender<TransportEvent>,
    shutdown_token: &CancellationToken,
) -> Disconnect {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            // Outbound commands ahead of reads, so a busy telemetry stream
            // cannot starve them.
            biased;
            _ = shutdown_token.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Disconnect::Shutdown;
            },
            Some(TransportCommand::Send(text)) = command_rx.recv() => {
                if let Err(e) = write.send(Message::Text(text)).await {
                    return Disconnect::Failed(e.into());
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    tracing::trace!(len = text.len(), "Received frame");
                    if event_tx.send(TransportEvent::Text(text)).await.is_err() {
                        let _ = write.send(Message::Close(None)).await;
                        return Disconnect::Shutdown;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(cf) = frame {
                        tracing::debug!(code = %cf.code, reason = %cf.reason, "Close frame received");
                    }
                    return Disconnect::ClosedByDevice;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                }
                // tungstenite answers pings itself
                Some(Ok(_)) => {}
                Some(Err(e)) => return Disconnect::Failed(e.into()),
                None => return Disconnect::ClosedByDevice,
            },
        }
    }
}
