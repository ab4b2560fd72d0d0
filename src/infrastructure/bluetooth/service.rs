//! Car Link Service
//!
//! Main coordinator - public API for applications driving the car.
//!
//! Owns the connection manager, the command dispatcher, and the receiving
//! end of the transport event queue. [`CarLinkService::run`] is the single
//! event loop everything is serialized onto: transport callbacks and command
//! dispatch both mutate the state machine from here and nowhere else.

use crate::domain::error::LinkError;
use crate::domain::models::{CarCommand, ConnectionState, LinkEvent, PeripheralAddress};
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::broadcaster::EventBroadcaster;
use crate::infrastructure::bluetooth::dispatcher::CommandDispatcher;
use crate::infrastructure::bluetooth::manager::{ConnectionManager, LinkConfig};
use crate::infrastructure::bluetooth::transport::{Transport, TransportEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

enum Step {
    Transport(TransportEvent),
    Command(CarCommand),
    Shutdown,
}

pub struct CarLinkService {
    manager: ConnectionManager,
    dispatcher: CommandDispatcher,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    commands: mpsc::UnboundedSender<CarCommand>,
}

impl CarLinkService {
    pub fn new(config: LinkConfig) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let broadcaster = EventBroadcaster::new(config.event_channel_capacity);

        Self {
            manager: ConnectionManager::new(config, broadcaster, transport_tx),
            dispatcher: CommandDispatcher::new(command_rx),
            transport_events: transport_rx,
            commands: command_tx,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.link_config())
    }

    /// Inject the platform transport.
    pub fn initialize(&mut self, transport: Arc<dyn Transport>) {
        self.manager.initialize(transport);
    }

    /// Start connecting to the car at `address`. Fire-and-forget; watch the
    /// event channel for the outcome.
    pub fn connect(&mut self, address: &PeripheralAddress) -> Result<(), LinkError> {
        self.manager.connect(address)
    }

    pub fn disconnect(&mut self) {
        self.manager.disconnect();
    }

    /// Release the session. Call on every shutdown path.
    pub fn close(&mut self) {
        self.manager.close();
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn is_ready(&self) -> bool {
        self.manager.is_ready()
    }

    /// Subscribe to lifecycle and discovery events.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.manager.events().subscribe()
    }

    /// A sender for the command channel, for the application's input side.
    pub fn command_sender(&self) -> mpsc::UnboundedSender<CarCommand> {
        self.commands.clone()
    }

    /// Submit one command. Fire-and-forget; commands sent while the link is
    /// not ready are dropped by the dispatcher.
    pub fn submit(&self, command: CarCommand) {
        let _ = self.commands.send(command);
    }

    /// Run the event loop until both channels are gone.
    pub async fn run(&mut self) {
        info!("car link event loop started");
        loop {
            let step = tokio::select! {
                event = self.transport_events.recv() => match event {
                    Some(event) => Step::Transport(event),
                    None => Step::Shutdown,
                },
                command = self.dispatcher.next() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Shutdown,
                },
            };

            match step {
                Step::Transport(event) => self.manager.handle_transport_event(event),
                Step::Command(command) => self.dispatcher.dispatch(&mut self.manager, command),
                Step::Shutdown => break,
            }
        }
        info!("car link event loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::transport::mock::{MockTransport, MOVE_HANDLE};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    async fn next_event(events: &mut broadcast::Receiver<LinkEvent>) -> LinkEvent {
        timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("timed out waiting for a link event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn the_event_loop_drives_connect_through_dispatch() {
        let mock = MockTransport::with_car_profile();
        let mut service = CarLinkService::new(LinkConfig::default());
        service.initialize(Arc::new(mock.clone()));

        let mut events = service.subscribe();
        let commands = service.command_sender();

        service
            .connect(&PeripheralAddress::from("AA:BB:CC:DD:EE:FF"))
            .unwrap();
        assert_eq!(service.state(), ConnectionState::Connecting);

        let worker = tokio::spawn(async move { service.run().await });

        mock.emit_connected(0);
        mock.emit_discovered(0, true);

        assert_eq!(next_event(&mut events).await, LinkEvent::Connected);
        assert_eq!(next_event(&mut events).await, LinkEvent::ServicesDiscovered);

        commands.send(CarCommand::Move(vec![0x01, 0x02])).unwrap();

        let mut writes = mock.writes(0);
        for _ in 0..100 {
            if !writes.is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
            writes = mock.writes(0);
        }
        assert_eq!(writes, vec![(MOVE_HANDLE, vec![0x01, 0x02])]);

        worker.abort();
    }

    #[tokio::test]
    async fn commands_submitted_while_disconnected_are_dropped_by_the_loop() {
        let mock = MockTransport::with_car_profile();
        let mut service = CarLinkService::new(LinkConfig::default());
        service.initialize(Arc::new(mock.clone()));

        // No connect: the link is not ready and there is no session at all
        service.submit(CarCommand::Move(vec![0x01]));
        let worker = tokio::spawn(async move { service.run().await });

        // Give the loop a chance to consume the command
        sleep(Duration::from_millis(50)).await;

        // The command vanished without touching the transport
        assert_eq!(mock.open_count(), 0);
        assert!(!worker.is_finished());

        worker.abort();
    }
}
