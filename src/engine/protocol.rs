//! src/engine/protocol.rs
//!
//! The synchronous protocol engine. It performs no I/O: the transport feeds it
//! phase changes and text frames, the presentation layer invokes actions, and
//! whatever it wants to send or show is queued for its owner to drain.

use super::{
    collectors::CollectorReconciler,
    outbox::Outbox,
    phase::{PhaseObserver, PhaseTracker},
    session::SessionSync,
    settings::{ConfigValue, SettingsFlow},
    telemetry::TelemetryBoard,
    transition::{TransitionMachine, TransitionState},
};
use crate::{
    codec::{self, Envelope},
    config::{self, Config},
    domain::{Action, ConnectionPhase, EngineView, Notice},
    error::Result,
};

#[derive(Debug)]
pub struct Engine {
    phase: PhaseTracker,
    outbox: Outbox,
    session: SessionSync,
    collectors: CollectorReconciler,
    transition: TransitionMachine,
    settings: SettingsFlow,
    telemetry: TelemetryBoard,
    project_prefix: String,
    suggested_project: String,
}

impl Engine {
    pub fn new(settings: SettingsFlow, project_prefix: impl Into<String>) -> Self {
        let project_prefix = project_prefix.into();
        Self {
            suggested_project: config::project_name(&project_prefix),
            project_prefix,
            phase: PhaseTracker::default(),
            outbox: Outbox::default(),
            session: SessionSync::default(),
            collectors: CollectorReconciler::default(),
            transition: TransitionMachine::default(),
            settings,
            telemetry: TelemetryBoard::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SettingsFlow::new(config.setting_key.clone(), config.setting_value.clone()),
            config.project_prefix.clone(),
        )
    }

    // --- Transport hooks ---

    pub fn on_phase_changed(&mut self, phase: ConnectionPhase) {
        let Some(change) = self.phase.set(phase) else {
            return;
        };
        tracing::info!(from = ?change.from, to = ?change.to, "Connection phase changed");
        self.outbox.set_link_open(change.to.is_open());

        // Fixed notification order: state request first, then configuration.
        let observers: [&mut dyn PhaseObserver; 2] = [&mut self.session, &mut self.settings];
        for observer in observers {
            observer.on_phase(change, &mut self.outbox);
        }
    }

    pub fn on_text(&mut self, text: &str) {
        match codec::decode(text) {
            Ok(envelope) => self.on_envelope(&envelope),
            Err(e) => tracing::warn!(error = %e, "Dropping malformed message"),
        }
    }

    pub fn on_envelope(&mut self, envelope: &Envelope) {
        // Rejections are surfaced uniformly, whatever the command.
        if envelope.rejected() {
            let command = envelope.command.clone().unwrap_or_else(|| "unknown".to_string());
            let message = envelope.message_text();
            tracing::warn!(command = %command, message = %message, "Device rejected command");
            self.outbox.notify(Notice::RemoteRejection { command, message });
        }

        if envelope.is_telemetry() {
            self.telemetry.ingest(envelope);
            return;
        }

        if let Some(snapshot) = self.session.handle(envelope) {
            self.collectors.adopt(&snapshot.collectors);
        }
        if self.transition.handle(envelope, &mut self.session)
            && envelope.is_command("start")
            && envelope.succeeded()
        {
            // The used name now exists on the device.
            self.suggested_project = config::project_name(&self.project_prefix);
        }
    }

    // --- Presentation actions ---

    pub fn set_enabled(&mut self, tag: &str, enabled: bool) -> bool {
        self.collectors
            .set_enabled(tag, enabled, self.session.state(), &mut self.outbox)
    }

    pub fn start(&mut self, project: &str) -> Result<()> {
        self.transition.start(project, &mut self.outbox)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.transition.stop(&mut self.outbox)
    }

    pub fn set_config_value(&mut self, value: impl Into<String>) {
        self.settings.set_value(value);
    }

    pub fn apply(&mut self) -> Result<()> {
        self.settings.apply(&mut self.outbox)
    }

    /// Re-issues `get_state`, e.g. after the device rejected the first one.
    pub fn resync(&mut self) -> Result<()> {
        self.session.request_state(&mut self.outbox)
    }

    /// Abandons an in-flight transition whose answer never came.
    pub fn expire_transition(&mut self) {
        if self.transition.expire() {
            tracing::warn!("Session transition timed out. Back to idle.");
            self.outbox.notify(Notice::TransitionTimedOut);
        }
    }

    /// Dispatches an action received from the presentation layer.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::SetEnabled { collector, enabled } => {
                self.set_enabled(&collector, enabled);
                Ok(())
            }
            Action::Start { project } => {
                let project = project.unwrap_or_else(|| self.suggested_project.clone());
                self.start(&project)
            }
            Action::Stop => self.stop(),
            Action::SetConfigValue { value } => {
                self.set_config_value(value);
                Ok(())
            }
            Action::Apply => self.apply(),
            Action::Resync => self.resync(),
        }
    }

    // --- Getters ---

    pub fn phase(&self) -> ConnectionPhase {
        self.phase.current()
    }

    pub fn is_enabled(&self, tag: &str) -> bool {
        self.collectors.is_enabled(tag)
    }

    pub fn synced(&self) -> bool {
        self.session.state().synced
    }

    pub fn running(&self) -> bool {
        self.session.state().running
    }

    pub fn transition_state(&self) -> TransitionState {
        self.transition.state()
    }

    pub fn transitioning(&self) -> bool {
        self.transition.is_pending()
    }

    pub fn config_value(&self) -> &ConfigValue {
        self.settings.current()
    }

    pub fn config_dirty(&self) -> bool {
        self.settings.current().dirty
    }

    /// The project name a `Start` without one will use.
    pub fn suggested_project(&self) -> &str {
        &self.suggested_project
    }

    pub fn telemetry(&self) -> &TelemetryBoard {
        &self.telemetry
    }

    pub fn view(&self) -> EngineView {
        let phase = self.phase();
        EngineView {
            phase,
            phase_label: phase.label().to_string(),
            synced: self.synced(),
            running: self.running(),
            transitioning: self.transitioning(),
            enabled_collectors: self.collectors.desired().clone(),
            config_value: self.settings.current().value.clone(),
            config_dirty: self.config_dirty(),
            suggested_project: self.suggested_project.clone(),
            telemetry: self.telemetry.snapshot(),
        }
    }

    // --- Queues ---

    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.outbox.drain_outbound()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.outbox.drain_notices()
    }
}
