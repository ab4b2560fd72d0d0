use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier of a remote peripheral.
///
/// The transport decides what the string means (a MAC address on most
/// platforms); this crate only compares and stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeripheralAddress(String);

impl PeripheralAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeripheralAddress {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for PeripheralAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection lifecycle state, mutated only by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Which of the two car control characteristics a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Move,
    Sound,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Sound => write!(f, "sound"),
        }
    }
}

/// A single command submitted by the application, consumed immediately by
/// the dispatcher. The payload bytes are opaque to this crate; the car
/// firmware defines their meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarCommand {
    Move(Vec<u8>),
    Sound(Vec<u8>),
}

impl CarCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Move(_) => CommandKind::Move,
            Self::Sound(_) => CommandKind::Sound,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Move(bytes) | Self::Sound(bytes) => bytes,
        }
    }

    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Self::Move(bytes) | Self::Sound(bytes) => bytes,
        }
    }
}

/// Lifecycle and discovery notifications published to observers.
///
/// Delivery is best-effort and at most once per underlying transition.
/// `DiscoveryFailed` is only published when explicitly enabled in the link
/// configuration; by default a failed discovery is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    ServicesDiscovered,
    DiscoveryFailed,
    /// Value read from a characteristic, see `ConnectionManager::read_attribute`.
    DataAvailable(Vec<u8>),
}
