//! src/codec.rs
//!
//! The wire contract with the device orchestrator. Outbound traffic is a
//! closed set of typed [`Command`]s; inbound traffic is an open [`Envelope`]
//! that keeps every field the device sends, known or not.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A command sent to the device. Serializes as `{"command": "<name>", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    GetState,
    SetCollectors { collectors: BTreeSet<String> },
    Start { project: String },
    Stop,
    SetSettings { config: BTreeMap<String, String> },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetState => "get_state",
            Command::SetCollectors { .. } => "set_collectors",
            Command::Start { .. } => "start",
            Command::Stop => "stop",
            Command::SetSettings { .. } => "set_settings",
        }
    }
}

/// An inbound message: either a command echo or unsolicited telemetry.
///
/// Fields the engine does not interpret are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The authoritative state carried by a `get_state` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub collectors: BTreeSet<String>,
    pub is_running: bool,
}

impl Envelope {
    /// Telemetry envelopes carry no `command` key.
    pub fn is_telemetry(&self) -> bool {
        self.command.is_none()
    }

    pub fn is_command(&self, name: &str) -> bool {
        self.command.as_deref() == Some(name)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.result, Some(Value::Bool(true)))
    }

    /// A `result` is present and is anything other than `true`.
    pub fn rejected(&self) -> bool {
        self.result.is_some() && !self.succeeded()
    }

    /// The `message` rendered for display, `"unknown"` when missing.
    pub fn message_text(&self) -> String {
        match &self.message {
            None => "unknown".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Extracts `collectors` and `is_running` from `message`. Returns `None`
    /// unless both are present and well typed.
    pub fn state_snapshot(&self) -> Option<StateSnapshot> {
        let body = self.message.as_ref()?.as_object()?;
        let is_running = body.get("is_running")?.as_bool()?;
        let collectors = body
            .get("collectors")?
            .as_array()?
            .iter()
            .map(|tag| tag.as_str().map(str::to_owned))
            .collect::<Option<BTreeSet<_>>>()?;
        Some(StateSnapshot { collectors, is_running })
    }
}

/// Serializes a command. Output is deterministic: set and map fields are ordered.
pub fn encode(command: &Command) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

/// Parses one inbound text frame.
pub fn decode(text: &str) -> Result<Envelope> {
    serde_json::from_str(text).map_err(|e| Error::MalformedMessage(e.to_string()))
}
