//! src/engine/session.rs
//!
//! The session synchronizer. Holds the device's authoritative state and the
//! `synced` flag that gates every mutation-pushing command.

use super::{
    outbox::Outbox,
    phase::{PhaseChange, PhaseObserver},
};
use crate::{
    codec::{Command, Envelope, StateSnapshot},
    error::Result,
};
use std::collections::BTreeSet;

/// The device's view of the world, as last reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub synced: bool,
    pub running: bool,
    pub enabled_collectors: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct SessionSync {
    state: SyncState,
    awaiting_state: bool,
}

impl SessionSync {
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn awaiting_state(&self) -> bool {
        self.awaiting_state
    }

    /// Sends `get_state` and arms the expectation for its answer.
    pub fn request_state(&mut self, outbox: &mut Outbox) -> Result<()> {
        outbox.send(&Command::GetState)?;
        self.awaiting_state = true;
        Ok(())
    }

    /// Applies a `get_state` answer if one is expected, was not rejected and
    /// carries both `collectors` and `is_running`. Returns the applied snapshot.
    pub fn handle(&mut self, envelope: &Envelope) -> Option<StateSnapshot> {
        if !envelope.is_command("get_state") {
            return None;
        }
        if !self.awaiting_state {
            tracing::debug!("Ignoring unsolicited get_state answer");
            return None;
        }
        if envelope.rejected() {
            tracing::debug!("get_state was rejected. State left untouched.");
            return None;
        }
        let Some(snapshot) = envelope.state_snapshot() else {
            tracing::warn!("get_state answer without collectors/is_running. Ignoring.");
            return None;
        };

        self.awaiting_state = false;
        self.state.enabled_collectors = snapshot.collectors.clone();
        self.state.running = snapshot.is_running;
        // Last, so anything gated on `synced` sees the final state.
        if !self.state.synced {
            tracing::info!(
                running = snapshot.is_running,
                collectors = ?snapshot.collectors,
                "Synchronized with device"
            );
        }
        self.state.synced = true;
        Some(snapshot)
    }

    /// Flips `running` after a successful start/stop answer.
    pub(crate) fn toggle_running(&mut self) {
        self.state.running = !self.state.running;
    }
}

impl PhaseObserver for SessionSync {
    fn on_phase(&mut self, change: PhaseChange, outbox: &mut Outbox) {
        if change.opened() {
            // The send cannot fail here: the outbox is opened before observers run.
            let _ = self.request_state(outbox);
        }
    }
}
