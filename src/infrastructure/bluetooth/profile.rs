//! Car GATT Profile
//!
//! Resolves the car control attributes from a connected session's
//! discovered service tree.

use crate::domain::error::LinkError;
use crate::domain::models::CommandKind;
use crate::infrastructure::bluetooth::manager::LinkConfig;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::transport::{AttributeHandle, Session};
use tracing::{error, warn};

/// The resolved car control profile.
///
/// The move characteristic is required; the sound characteristic is not.
/// Car modules without a sound board omit it and the link stays usable for
/// driving; a Sound command against such a profile is treated as a vanished
/// attribute by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarProfile {
    pub move_char: AttributeHandle,
    pub sound_char: Option<AttributeHandle>,
}

impl CarProfile {
    /// Resolve the profile from a session whose service discovery completed.
    ///
    /// Both characteristic lookups are attempted regardless of the other's
    /// outcome, so a missing sound characteristic is reported even when the
    /// move lookup also fails.
    pub fn resolve(session: &dyn Session, config: &LinkConfig) -> Result<Self, LinkError> {
        let service_uuid = protocol::parse_uuid(&config.service_uuid)?;
        let move_uuid = protocol::parse_uuid(&config.move_char_uuid)?;
        let sound_uuid = protocol::parse_uuid(&config.sound_char_uuid)?;

        let service = session.find_service(service_uuid).ok_or_else(|| {
            error!("car control service {} not found", config.service_uuid);
            LinkError::ServiceNotFound(config.service_uuid.clone())
        })?;

        let move_char = session.find_characteristic(service, move_uuid);
        let sound_char = session.find_characteristic(service, sound_uuid);

        if sound_char.is_none() {
            warn!(
                "sound characteristic {} not found, sound commands unavailable",
                config.sound_char_uuid
            );
        }

        let move_char = move_char.ok_or_else(|| {
            error!("move characteristic {} not found", config.move_char_uuid);
            LinkError::CharacteristicNotFound(config.move_char_uuid.clone())
        })?;

        Ok(Self {
            move_char,
            sound_char,
        })
    }

    /// The attribute a command of `kind` is written to, if the profile has it.
    pub fn attribute_for(&self, kind: CommandKind) -> Option<AttributeHandle> {
        match kind {
            CommandKind::Move => Some(self.move_char),
            CommandKind::Sound => self.sound_char,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PeripheralAddress;
    use crate::infrastructure::bluetooth::transport::mock::{
        MockTransport, MOVE_HANDLE, SOUND_HANDLE,
    };
    use crate::infrastructure::bluetooth::transport::Transport;
    use tokio::sync::mpsc;

    fn open(mock: &MockTransport) -> Box<dyn Session> {
        let (tx, _rx) = mpsc::unbounded_channel();
        mock.open_session(&PeripheralAddress::from("AA:BB"), tx)
            .unwrap()
    }

    #[test]
    fn resolves_both_characteristics() {
        let mock = MockTransport::with_car_profile();
        let session = open(&mock);

        let profile = CarProfile::resolve(session.as_ref(), &LinkConfig::default()).unwrap();
        assert_eq!(profile.move_char, MOVE_HANDLE);
        assert_eq!(profile.sound_char, Some(SOUND_HANDLE));
        assert_eq!(profile.attribute_for(CommandKind::Move), Some(MOVE_HANDLE));
        assert_eq!(
            profile.attribute_for(CommandKind::Sound),
            Some(SOUND_HANDLE)
        );
    }

    #[test]
    fn missing_service_is_fatal() {
        let mock = MockTransport::empty();
        let session = open(&mock);

        let err = CarProfile::resolve(session.as_ref(), &LinkConfig::default()).unwrap_err();
        assert!(matches!(err, LinkError::ServiceNotFound(_)));
    }

    #[test]
    fn missing_move_characteristic_is_fatal() {
        let mock = MockTransport::without_move_char();
        let session = open(&mock);

        let err = CarProfile::resolve(session.as_ref(), &LinkConfig::default()).unwrap_err();
        assert!(matches!(err, LinkError::CharacteristicNotFound(_)));
    }

    #[test]
    fn missing_sound_characteristic_is_not_fatal() {
        let mock = MockTransport::without_sound_char();
        let session = open(&mock);

        let profile = CarProfile::resolve(session.as_ref(), &LinkConfig::default()).unwrap();
        assert_eq!(profile.move_char, MOVE_HANDLE);
        assert_eq!(profile.sound_char, None);
        assert_eq!(profile.attribute_for(CommandKind::Sound), None);
    }

    #[test]
    fn malformed_configured_uuid_is_reported() {
        let mock = MockTransport::with_car_profile();
        let session = open(&mock);

        let config = LinkConfig {
            service_uuid: "garbage".to_string(),
            ..LinkConfig::default()
        };
        let err = CarProfile::resolve(session.as_ref(), &config).unwrap_err();
        assert!(matches!(err, LinkError::InvalidUuid(_)));
    }
}
