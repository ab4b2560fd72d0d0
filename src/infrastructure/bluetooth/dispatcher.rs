//! Command Dispatcher
//!
//! Consumes move/sound commands from the application's command channel and
//! writes them to the car. Commands arriving while the link is not ready are
//! dropped, not deferred; nothing is ever queued toward a peripheral that
//! cannot take it.

use crate::domain::models::CarCommand;
use crate::infrastructure::bluetooth::manager::ConnectionManager;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub struct CommandDispatcher {
    commands: mpsc::UnboundedReceiver<CarCommand>,
}

impl CommandDispatcher {
    pub fn new(commands: mpsc::UnboundedReceiver<CarCommand>) -> Self {
        Self { commands }
    }

    /// Await the next submitted command. `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<CarCommand> {
        self.commands.recv().await
    }

    /// Dispatch one command through the manager's open session.
    ///
    /// A vanished target attribute means the resolved profile no longer
    /// matches the peripheral, and the whole link is torn down. A rejected
    /// write is only logged; it is not retried and not escalated.
    pub fn dispatch(&mut self, manager: &mut ConnectionManager, command: CarCommand) {
        let kind = command.kind();
        debug!("received {} command", kind);

        if !manager.is_ready() {
            info!("car profile not resolved yet, dropping {} command", kind);
            return;
        }

        let attribute = manager
            .profile()
            .and_then(|profile| profile.attribute_for(kind));
        let Some(attribute) = attribute else {
            error!(
                "{} characteristic no longer available, tearing the link down",
                kind
            );
            manager.disconnect();
            return;
        };

        let payload = command.into_payload();
        if !manager.write_attribute(attribute, &payload) {
            error!("write of {} payload {:02X?} was rejected", kind, payload);
        }
    }
}
