//! Link Event Broadcaster
//!
//! Best-effort fan-out of lifecycle and discovery events to all current
//! subscribers. Delivery is attempted once, synchronously, at the point of
//! state change; there is no queue for late subscribers and no replay.

use crate::domain::models::LinkEvent;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<LinkEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to link events. Only events published after this call are
    /// received; a slow receiver loses the oldest events first.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers. Fire-and-forget: having
    /// no subscribers is not an error.
    pub fn publish(&self, event: LinkEvent) {
        debug!("publishing link event: {:?}", event);
        let _ = self.sender.send(event);
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(16)
    }
}
