//! BLE Transport Boundary
//!
//! The platform BLE stack sits behind these traits. The link core never
//! talks to a radio directly: it opens a [`Session`] through a [`Transport`]
//! and receives the stack's asynchronous callbacks as typed
//! [`TransportEvent`] values on a single-consumer queue. Everything the core
//! mutates in response is owned by one event loop, so no shared state is
//! touched off that loop.

use crate::domain::error::LinkError;
use crate::domain::models::PeripheralAddress;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Transport-assigned identity of one physical connection attempt.
///
/// Events from a superseded session keep carrying its id; the state machine
/// uses the id to drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle of a discovered service within a session's attribute tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceHandle(pub u16);

/// Handle of a discovered characteristic within a session's attribute tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeHandle(pub u16);

impl fmt::Display for AttributeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Asynchronous callbacks from the transport, delivered on the event queue
/// handed to [`Transport::open_session`].
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The physical link for `session` came up.
    Connected { session: SessionId },
    /// The physical link for `session` went down (requested or not).
    Disconnected { session: SessionId },
    /// Service discovery for `session` finished.
    ServicesDiscovered { session: SessionId, success: bool },
    /// A previously requested characteristic read completed.
    AttributeValue {
        session: SessionId,
        attribute: AttributeHandle,
        value: Vec<u8>,
    },
}

impl TransportEvent {
    /// The session this event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            Self::Connected { session }
            | Self::Disconnected { session }
            | Self::ServicesDiscovered { session, .. }
            | Self::AttributeValue { session, .. } => *session,
        }
    }
}

/// Factory for transport sessions; implemented by the platform BLE stack.
pub trait Transport: Send + Sync {
    /// Open a new session targeting `address`.
    ///
    /// Returns immediately with the session handle; connection outcome and
    /// everything after it arrive on `events`. An error here means the stack
    /// refused to even start the attempt.
    fn open_session(
        &self,
        address: &PeripheralAddress,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn Session>, LinkError>;
}

/// One live transport-level connection to a specific peripheral address.
///
/// All methods are fire-and-forget from the caller's point of view: they
/// return whether the stack accepted the request, and the actual outcome (if
/// any) arrives as a [`TransportEvent`].
pub trait Session: Send {
    fn id(&self) -> SessionId;

    fn address(&self) -> &PeripheralAddress;

    /// Re-establish the link on an existing session (reconnect to the same
    /// address without tearing the handle down). Returns false if the stack
    /// cannot resume it.
    fn resume(&mut self) -> bool;

    /// Request a transport-level disconnect. The `Disconnected` transition
    /// arrives asynchronously.
    fn disconnect(&mut self);

    /// Release the underlying transport resource. After this the session is
    /// dead; it must be called exactly once on every exit path.
    fn close(&mut self);

    /// Kick off service discovery. Returns whether the request was accepted;
    /// completion arrives as `ServicesDiscovered`.
    fn discover_services(&mut self) -> bool;

    /// Look up a discovered service by UUID.
    fn find_service(&self, uuid: Uuid) -> Option<ServiceHandle>;

    /// Look up a characteristic by UUID within a discovered service.
    fn find_characteristic(&self, service: ServiceHandle, uuid: Uuid) -> Option<AttributeHandle>;

    /// Write `payload` to a characteristic. Returns whether the stack
    /// accepted the write.
    fn write_attribute(&mut self, attribute: AttributeHandle, payload: &[u8]) -> bool;

    /// Request a characteristic read; the value arrives as
    /// [`TransportEvent::AttributeValue`].
    fn read_attribute(&mut self, attribute: AttributeHandle) -> bool;

    /// Enable or disable notifications on a characteristic.
    fn set_notifications(&mut self, attribute: AttributeHandle, enabled: bool) -> bool;
}
