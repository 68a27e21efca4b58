//! src/engine/outbox.rs
//!
//! Queues what the engine wants to say: encoded commands for the transport and
//! notices for the presentation layer. Sends are refused while the link is not
//! open.

use crate::{
    codec::{self, Command},
    domain::Notice,
    error::{Error, Result},
};
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct Outbox {
    link_open: bool,
    outbound: VecDeque<String>,
    notices: VecDeque<Notice>,
}

impl Outbox {
    pub(crate) fn set_link_open(&mut self, open: bool) {
        self.link_open = open;
    }

    /// Encodes and queues `command`. While the link is down the command is
    /// dropped and a `TransportUnavailable` notice is raised instead.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        if !self.link_open {
            tracing::warn!(command = command.name(), "Link is not open. Dropping command.");
            self.notify(Notice::TransportUnavailable {
                command: command.name().to_string(),
            });
            return Err(Error::TransportUnavailable { command: command.name() });
        }
        let text = codec::encode(command)?;
        tracing::debug!(command = command.name(), "Queued command");
        self.outbound.push_back(text);
        Ok(())
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.outbound.drain(..).collect()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}
