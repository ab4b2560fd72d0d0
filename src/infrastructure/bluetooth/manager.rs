//! Connection Manager
//!
//! Owns the connection lifecycle for the single car peripheral: opening and
//! resuming sessions, reacting to transport callbacks, triggering service
//! discovery, and holding the readiness flag that gates every command write.
//!
//! All state in here is mutated through `&mut self` from one event loop
//! (see `service`); the transport's asynchronous callbacks are serialized
//! onto that loop as [`TransportEvent`] values before they touch anything.

use crate::domain::error::LinkError;
use crate::domain::models::{ConnectionState, LinkEvent, PeripheralAddress};
use crate::infrastructure::bluetooth::broadcaster::EventBroadcaster;
use crate::infrastructure::bluetooth::profile::CarProfile;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::transport::{
    AttributeHandle, Session, Transport, TransportEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Configuration for connection behavior
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Car control service UUID
    pub service_uuid: String,
    /// Move characteristic UUID
    pub move_char_uuid: String,
    /// Sound characteristic UUID
    pub sound_char_uuid: String,
    /// Publish `LinkEvent::DiscoveryFailed` when discovery fails instead of
    /// staying silent
    pub emit_discovery_failed: bool,
    /// Capacity of the observer event channel
    pub event_channel_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            service_uuid: protocol::CAR_SERVICE_UUID.to_string(),
            move_char_uuid: protocol::CAR_MOVE_CHAR_UUID.to_string(),
            sound_char_uuid: protocol::CAR_SOUND_CHAR_UUID.to_string(),
            emit_discovery_failed: false,
            event_channel_capacity: 16,
        }
    }
}

/// The connection lifecycle state machine.
pub struct ConnectionManager {
    config: LinkConfig,
    transport: Option<Arc<dyn Transport>>,
    address: Option<PeripheralAddress>,
    session: Option<Box<dyn Session>>,
    state: ConnectionState,
    profile: Option<CarProfile>,
    ready: bool,
    events: EventBroadcaster,
    transport_events: mpsc::UnboundedSender<TransportEvent>,
}

impl ConnectionManager {
    pub fn new(
        config: LinkConfig,
        events: EventBroadcaster,
        transport_events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            config,
            transport: None,
            address: None,
            session: None,
            state: ConnectionState::Disconnected,
            profile: None,
            ready: false,
            events,
            transport_events,
        }
    }

    /// Inject the platform transport. Until this is called every `connect`
    /// fails with [`LinkError::NotInitialized`].
    pub fn initialize(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True only while the link is connected and the car profile resolved.
    /// The single gate for every command write.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn profile(&self) -> Option<CarProfile> {
        self.profile
    }

    pub fn address(&self) -> Option<&PeripheralAddress> {
        self.address.as_ref()
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// Start connecting to `address`. Returns immediately; the outcome
    /// arrives through the transport event queue.
    ///
    /// Any previously resolved profile is invalidated before anything else
    /// happens.
    pub fn connect(&mut self, address: &PeripheralAddress) -> Result<(), LinkError> {
        self.ready = false;
        self.profile = None;

        let Some(transport) = self.transport.clone() else {
            warn!("transport not initialized, cannot connect");
            return Err(LinkError::NotInitialized);
        };

        // Previously targeted peripheral - try to resume the existing session
        if self.address.as_ref() == Some(address) {
            if let Some(session) = self.session.as_mut() {
                debug!("trying to resume the existing session for {}", address);
                if session.resume() {
                    self.state = ConnectionState::Connecting;
                    return Ok(());
                }
                warn!("transport refused to resume the session for {}", address);
                return Err(LinkError::ConnectFailed(address.clone()));
            }
        }

        // A superseded session is released here and nowhere else
        if let Some(mut old) = self.session.take() {
            debug!("superseding session {} for {}", old.id(), old.address());
            old.close();
        }

        let session = transport
            .open_session(address, self.transport_events.clone())
            .map_err(|err| {
                warn!("unable to open a session to {}: {}", address, err);
                LinkError::ConnectFailed(address.clone())
            })?;

        debug!("opened session {} to {}", session.id(), address);
        self.session = Some(session);
        self.address = Some(address.clone());
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Request a transport-level disconnect. Readiness drops synchronously;
    /// the `Disconnected` transition arrives through the event queue.
    pub fn disconnect(&mut self) {
        self.ready = false;
        if self.transport.is_none() || self.session.is_none() {
            warn!("transport not initialized or no open session, nothing to disconnect");
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.disconnect();
        }
    }

    /// Release the session and its transport resource. Safe to call on every
    /// exit path; the session is released at most once.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!("releasing session {}", session.id());
            session.close();
        }
    }

    /// Entry point for the transport's asynchronous callbacks. Events from a
    /// session other than the current one are dropped: a superseded or closed
    /// attempt may still complete in the transport, and its outcome no longer
    /// means anything here.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        let Some(current) = self.session.as_ref().map(|s| s.id()) else {
            debug!("transport event with no active session, ignoring: {:?}", event);
            return;
        };
        if event.session() != current {
            debug!(
                "transport event from stale session {}, ignoring: {:?}",
                event.session(),
                event
            );
            return;
        }

        match event {
            TransportEvent::Connected { .. } => self.on_connected(),
            TransportEvent::Disconnected { .. } => self.on_disconnected(),
            TransportEvent::ServicesDiscovered { success, .. } => {
                self.on_services_discovered(success)
            }
            TransportEvent::AttributeValue { value, .. } => self.on_attribute_value(value),
        }
    }

    fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        info!("connected to GATT server");
        self.events.publish(LinkEvent::Connected);

        // Discovery has not completed yet
        self.ready = false;
        if let Some(session) = self.session.as_mut() {
            let initiated = session.discover_services();
            info!("requesting service discovery: {}", initiated);
        }
    }

    fn on_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.ready = false;
        self.profile = None;
        info!("disconnected from GATT server");
        self.events.publish(LinkEvent::Disconnected);
    }

    fn on_services_discovered(&mut self, success: bool) {
        if !success {
            warn!("service discovery failed");
            self.ready = false;
            if self.config.emit_discovery_failed {
                self.events.publish(LinkEvent::DiscoveryFailed);
            }
            return;
        }

        let Some(session) = self.session.as_ref() else {
            return;
        };
        match CarProfile::resolve(session.as_ref(), &self.config) {
            Ok(profile) => {
                self.profile = Some(profile);
                self.ready = true;
                self.events.publish(LinkEvent::ServicesDiscovered);
            }
            Err(err) => {
                error!("peripheral is not compatible with the car profile: {}", err);
                self.profile = None;
                self.ready = false;
            }
        }
    }

    fn on_attribute_value(&mut self, value: Vec<u8>) {
        self.events.publish(LinkEvent::DataAvailable(value));
    }

    /// Write through the open session. Callers gate on [`is_ready`] first;
    /// without a session the write is simply not accepted.
    pub(crate) fn write_attribute(&mut self, attribute: AttributeHandle, payload: &[u8]) -> bool {
        match self.session.as_mut() {
            Some(session) => session.write_attribute(attribute, payload),
            None => false,
        }
    }

    /// Request a characteristic read; the value arrives as
    /// [`LinkEvent::DataAvailable`].
    pub fn read_attribute(&mut self, attribute: AttributeHandle) -> bool {
        match self.session.as_mut() {
            Some(session) => session.read_attribute(attribute),
            None => {
                warn!("no open session, dropping read of {}", attribute);
                false
            }
        }
    }

    /// Enable or disable notifications on a characteristic.
    pub fn set_notifications(&mut self, attribute: AttributeHandle, enabled: bool) -> bool {
        match self.session.as_mut() {
            Some(session) => session.set_notifications(attribute, enabled),
            None => {
                warn!("no open session, cannot change notifications for {}", attribute);
                false
            }
        }
    }
}
