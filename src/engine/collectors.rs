//! src/engine/collectors.rs
//!
//! Reconciles the locally desired set of enabled collectors with the device.
//! Every change re-sends the whole set; the device replaces its set wholesale,
//! so no acknowledgement tracking is needed.

use super::{outbox::Outbox, session::SyncState};
use crate::codec::Command;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct CollectorReconciler {
    desired: BTreeSet<String>,
}

impl CollectorReconciler {
    pub fn is_enabled(&self, tag: &str) -> bool {
        self.desired.contains(tag)
    }

    pub fn desired(&self) -> &BTreeSet<String> {
        &self.desired
    }

    /// Adds or removes `tag` from the desired set. Once synced, any actual
    /// change is pushed as a full `set_collectors`. Returns whether the set
    /// changed.
    ///
    /// Callers are expected not to toggle while a session is running; this is
    /// not enforced here.
    pub fn set_enabled(
        &mut self,
        tag: &str,
        enabled: bool,
        sync: &SyncState,
        outbox: &mut Outbox,
    ) -> bool {
        let changed = if enabled {
            self.desired.insert(tag.to_string())
        } else {
            self.desired.remove(tag)
        };
        if changed && sync.synced {
            // A refused send already raised a notice; the next Open resyncs.
            let _ = outbox.send(&Command::SetCollectors {
                collectors: self.desired.clone(),
            });
        }
        changed
    }

    /// Replaces local intent with the device's authoritative set. Nothing is
    /// pushed: the set came from the device.
    pub fn adopt(&mut self, authoritative: &BTreeSet<String>) {
        self.desired = authoritative.clone();
    }
}
