//! RC car BLE link.
//!
//! Manages the client side of a Bluetooth Low Energy connection to an RC
//! car peripheral: the connection lifecycle, resolution of the car control
//! GATT profile, and dispatch of move/sound command writes once the link is
//! ready. The platform BLE stack is injected behind the
//! [`Transport`]/[`Session`] traits; applications submit commands over a
//! channel and observe lifecycle events over another.
//!
//! ```no_run
//! use rccar_link_rust::{CarCommand, CarLinkService, LinkConfig, PeripheralAddress};
//! # use std::sync::Arc;
//! # fn transport() -> Arc<dyn rccar_link_rust::Transport> { unimplemented!() }
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut service = CarLinkService::new(LinkConfig::default());
//! service.initialize(transport());
//!
//! let mut events = service.subscribe();
//! let commands = service.command_sender();
//!
//! service.connect(&PeripheralAddress::from("AA:BB:CC:DD:EE:FF"))?;
//! tokio::spawn(async move { service.run().await });
//!
//! // ... once ServicesDiscovered arrives on `events`:
//! commands.send(CarCommand::Move(vec![0x01, 0x7F]))?;
//! # let _ = events.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod infrastructure;

pub use domain::error::LinkError;
pub use domain::models::{
    CarCommand, CommandKind, ConnectionState, LinkEvent, PeripheralAddress,
};
pub use domain::settings::{LogSettings, Settings, SettingsService};
pub use infrastructure::bluetooth::broadcaster::EventBroadcaster;
pub use infrastructure::bluetooth::dispatcher::CommandDispatcher;
pub use infrastructure::bluetooth::manager::{ConnectionManager, LinkConfig};
pub use infrastructure::bluetooth::profile::CarProfile;
pub use infrastructure::bluetooth::protocol;
pub use infrastructure::bluetooth::service::CarLinkService;
pub use infrastructure::bluetooth::transport::{
    AttributeHandle, ServiceHandle, Session, SessionId, Transport, TransportEvent,
};
pub use infrastructure::logging::{init_logger, LoggingGuard};
