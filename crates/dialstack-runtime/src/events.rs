//! Manager event publishing
//!
//! Every successful frame-local install or update publishes a `VarSet`
//! event toward the host's event manager. Publishing is best-effort over a
//! bounded queue: a full queue drops the event rather than blocking the
//! dialplan thread.

use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

use crate::channel::Channel;

/// Default capacity of the event queue
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A `VarSet` manager event for a frame-local variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSetEvent {
    pub channel: String,
    /// Rendered as `LOCAL(name)`, matching how the dialplan addresses it
    pub variable: String,
    pub value: String,
    pub uniqueid: String,
}

impl fmt::Display for VarSetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event: VarSet\r\nChannel: {}\r\nVariable: {}\r\nValue: {}\r\nUniqueid: {}\r\n\r\n",
            self.channel, self.variable, self.value, self.uniqueid
        )
    }
}

/// Best-effort sender half of the manager event queue
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: Option<mpsc::Sender<VarSetEvent>>,
}

impl EventPublisher {
    /// Create a publisher with a bounded queue of `capacity` events
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<VarSetEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A publisher with no manager attached; every publish is a no-op
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub(crate) fn publish_local_set(&self, chan: &Channel, name: &str, value: &str) {
        let Some(tx) = &self.tx else {
            return;
        };
        let event = VarSetEvent {
            channel: chan.name().to_string(),
            variable: format!("LOCAL({name})"),
            value: value.to_string(),
            uniqueid: chan.uniqueid().to_string(),
        };
        if let Err(err) = tx.try_send(event) {
            // back-pressure or a gone manager; either way the event is dropped
            debug!(channel = chan.name(), %err, "dropped VarSet event");
        }
    }
}
