//! src/domain.rs
//!
//! Consolidates the data structures shared between services: the connection
//! phase reported by the transport, the notices and actions exchanged with the
//! presentation layer, and the read-only view the engine publishes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// --- Connection Phase ---

/// Lifecycle of the device link. Only the transport assigns it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    #[default]
    Uninstantiated,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionPhase {
    /// Human-readable status shown by the connection widget.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionPhase::Uninstantiated => "ERROR!",
            ConnectionPhase::Connecting => "Connecting...",
            ConnectionPhase::Open => "Connected",
            ConnectionPhase::Closing => "Disconnecting",
            ConnectionPhase::Closed => "Not Connected",
        }
    }

    pub fn is_open(self) -> bool {
        self == ConnectionPhase::Open
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Transport Messages ---

/// Events emitted by the transport towards the engine, in receipt order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Phase(ConnectionPhase),
    Text(String),
}

/// Commands that can be sent to the `Transport` service.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    Send(String),
}

// --- Presentation Contract ---

/// A user-visible, non-fatal notice raised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The device answered a command with `result != true`.
    RemoteRejection { command: String, message: String },
    /// A command was dropped because the link was not open.
    TransportUnavailable { command: String },
    /// No start/stop answer arrived before the deadline.
    TransitionTimedOut,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RemoteRejection { message, .. } => write!(f, "ERROR: {message}"),
            Notice::TransportUnavailable { command } => {
                write!(f, "Not connected, `{command}` was not sent")
            }
            Notice::TransitionTimedOut => f.write_str("The device did not answer in time"),
        }
    }
}

/// Actions the presentation layer may invoke on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    SetEnabled { collector: String, enabled: bool },
    /// Starts a session. Without a `project`, the suggested name is used.
    Start {
        #[serde(default)]
        project: Option<String>,
    },
    Stop,
    SetConfigValue { value: String },
    Apply,
    Resync,
}

/// A read-only snapshot of everything the presentation layer may display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineView {
    pub phase: ConnectionPhase,
    pub phase_label: String,
    pub synced: bool,
    pub running: bool,
    pub transitioning: bool,
    pub enabled_collectors: BTreeSet<String>,
    pub config_value: String,
    pub config_dirty: bool,
    pub suggested_project: String,
    pub telemetry: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}
