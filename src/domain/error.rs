use crate::domain::models::PeripheralAddress;
use thiserror::Error;

/// Failures surfaced by the link core.
///
/// Only initialization and connect failures reach a caller synchronously;
/// discovery and write failures are asynchronous and are logged where they
/// occur, because nobody is waiting on them.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("bluetooth transport not initialized")]
    NotInitialized,

    #[error("failed to open or resume a connection to {0}")]
    ConnectFailed(PeripheralAddress),

    #[error("car control service {0} not found on the peripheral")]
    ServiceNotFound(String),

    #[error("characteristic {0} not found in the car control service")]
    CharacteristicNotFound(String),

    #[error("transport rejected the attribute write")]
    WriteRejected,

    #[error("invalid UUID in link configuration: {0}")]
    InvalidUuid(String),
}
