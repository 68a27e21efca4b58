//! src/engine/telemetry.rs
//!
//! Demultiplexes unsolicited telemetry by component tag. Each field keeps its
//! last value until a later message carries that field again.

use crate::codec::Envelope;
use serde_json::Value;
use std::collections::BTreeMap;

pub const POLAR: &str = "polar";
pub const BUTTONS: &str = "buttons";
pub const ECG: &str = "ecg";
pub const ACC: &str = "acc";
pub const BUTTON: &str = "button";
pub const LOG: &str = "log";

/// Placeholder shown before a field has ever been reported.
pub const NO_VALUE: &str = "--";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryBoard {
    components: BTreeMap<String, BTreeMap<String, Value>>,
}

impl TelemetryBoard {
    /// Merges a telemetry envelope into the board. Returns whether anything
    /// was updated.
    pub fn ingest(&mut self, envelope: &Envelope) -> bool {
        let (Some(component), Some(data)) = (&envelope.component, &envelope.data) else {
            tracing::debug!("Telemetry without component or data. Ignoring.");
            return false;
        };
        let mut present = data.iter().filter(|(_, v)| !v.is_null()).peekable();
        let updated = present.peek().is_some();
        if updated {
            let fields = self.components.entry(component.clone()).or_default();
            fields.extend(present.map(|(name, value)| (name.clone(), value.clone())));
        }
        if let Some(Value::String(line)) = data.get(LOG) {
            tracing::debug!(component = %component, line = %line, "Device log");
        }
        updated
    }

    pub fn field(&self, component: &str, name: &str) -> Option<&Value> {
        self.components.get(component)?.get(name)
    }

    /// The field formatted for display, or [`NO_VALUE`].
    pub fn display(&self, component: &str, name: &str) -> String {
        match self.field(component, name) {
            None => NO_VALUE.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
        self.components.clone()
    }
}
