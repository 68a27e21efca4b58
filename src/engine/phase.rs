//! src/engine/phase.rs
//!
//! Tracks the connection phase reported by the transport and turns raw phase
//! notifications into edges that the rest of the engine can react to.

use super::outbox::Outbox;
use crate::domain::ConnectionPhase;

/// A change of phase, from one value to a different one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: ConnectionPhase,
    pub to: ConnectionPhase,
}

impl PhaseChange {
    /// The link just became usable. This is the resynchronization trigger.
    pub fn opened(&self) -> bool {
        !self.from.is_open() && self.to.is_open()
    }
}

/// Implemented by components that react to phase changes. The engine
/// notifies observers in a fixed order.
pub trait PhaseObserver {
    fn on_phase(&mut self, change: PhaseChange, outbox: &mut Outbox);
}

#[derive(Debug, Default)]
pub struct PhaseTracker {
    current: ConnectionPhase,
}

impl PhaseTracker {
    pub fn current(&self) -> ConnectionPhase {
        self.current
    }

    /// Records the phase reported by the transport. Returns `None` when the
    /// phase did not actually change.
    pub(crate) fn set(&mut self, to: ConnectionPhase) -> Option<PhaseChange> {
        let from = self.current;
        if from == to {
            return None;
        }
        if !is_expected(from, to) {
            tracing::debug!(?from, ?to, "Unusual phase transition reported by transport");
        }
        self.current = to;
        Some(PhaseChange { from, to })
    }
}

fn is_expected(from: ConnectionPhase, to: ConnectionPhase) -> bool {
    use ConnectionPhase::*;
    matches!(
        (from, to),
        (Uninstantiated, Connecting)
            | (Connecting, Open)
            | (Connecting, Closed)
            | (Open, Closing)
            | (Open, Closed)
            | (Closing, Open)
            | (Closing, Closed)
            | (Closed, Connecting)
    )
}
