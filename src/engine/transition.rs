//! src/engine/transition.rs
//!
//! Start/stop of the recording session. At most one transition is in flight,
//! which is what lets a successful answer simply flip `running`.

use super::{outbox::Outbox, session::SessionSync};
use crate::{
    codec::{Command, Envelope},
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionState {
    #[default]
    Idle,
    Pending,
}

#[derive(Debug, Default)]
pub struct TransitionMachine {
    state: TransitionState,
}

impl TransitionMachine {
    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == TransitionState::Pending
    }

    pub fn start(&mut self, project: &str, outbox: &mut Outbox) -> Result<()> {
        self.begin(
            &Command::Start {
                project: project.to_string(),
            },
            outbox,
        )
    }

    pub fn stop(&mut self, outbox: &mut Outbox) -> Result<()> {
        self.begin(&Command::Stop, outbox)
    }

    fn begin(&mut self, command: &Command, outbox: &mut Outbox) -> Result<()> {
        if self.is_pending() {
            tracing::warn!(command = command.name(), "Transition already in flight. Refusing.");
            return Err(Error::TransitionPending);
        }
        outbox.send(command)?;
        self.state = TransitionState::Pending;
        Ok(())
    }

    /// Handles a `start`/`stop` answer: always back to idle, and on success
    /// `running` flips. Returns whether the envelope was a transition answer.
    pub fn handle(&mut self, envelope: &Envelope, session: &mut SessionSync) -> bool {
        if !(envelope.is_command("start") || envelope.is_command("stop")) {
            return false;
        }
        if !self.is_pending() {
            tracing::warn!(command = ?envelope.command, "Transition answer arrived while idle");
        }
        self.state = TransitionState::Idle;
        if envelope.succeeded() {
            session.toggle_running();
            tracing::info!(running = session.state().running, "Session transition completed");
        }
        true
    }

    /// Safety net for an answer that never comes. Returns whether a pending
    /// transition was abandoned.
    pub fn expire(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.state = TransitionState::Idle;
        was_pending
    }
}
