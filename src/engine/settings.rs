//! src/engine/settings.rs
//!
//! The per-device configuration value. The device forgets its settings when it
//! restarts, so the value is re-applied on every Open, dirty or not.

use super::{
    outbox::Outbox,
    phase::{PhaseChange, PhaseObserver},
};
use crate::{codec::Command, error::Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigValue {
    pub value: String,
    pub dirty: bool,
}

#[derive(Debug)]
pub struct SettingsFlow {
    key: String,
    current: ConfigValue,
}

impl SettingsFlow {
    /// `key` is the name the value is sent under in `set_settings.config`.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            current: ConfigValue {
                value: value.into(),
                dirty: false,
            },
        }
    }

    pub fn current(&self) -> &ConfigValue {
        &self.current
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.current.value = value.into();
        self.current.dirty = true;
    }

    /// Sends the current value. A refused send leaves the value dirty.
    pub fn apply(&mut self, outbox: &mut Outbox) -> Result<()> {
        let config = BTreeMap::from([(self.key.clone(), self.current.value.clone())]);
        outbox.send(&Command::SetSettings { config })?;
        self.current.dirty = false;
        Ok(())
    }
}

impl PhaseObserver for SettingsFlow {
    fn on_phase(&mut self, change: PhaseChange, outbox: &mut Outbox) {
        if change.opened() {
            tracing::debug!(key = %self.key, "Re-applying device configuration");
            let _ = self.apply(outbox);
        }
    }
}
