//! src/api/protocol.rs
//!
//! Defines the data contract for the console WebSocket. Clients receive
//! [`ConsoleMessage`]s and send [`crate::domain::Action`]s.

use crate::domain::{EngineView, Notice};
use serde::{Deserialize, Serialize};

/// A structured message sent from the server to a console client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ConsoleMessage {
    #[serde(rename = "snapshot")]
    Snapshot(EngineView),
    #[serde(rename = "notice")]
    Notice(Notice),
}
