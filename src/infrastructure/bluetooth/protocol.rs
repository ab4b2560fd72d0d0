//! RC Car Control Protocol
//!
//! Protocol identifiers shared between this crate and the car firmware.
//! One service exposes the two writable control characteristics; neither
//! is renegotiated at runtime.

use crate::domain::error::LinkError;
use uuid::Uuid;

/// RC car control BLE service UUID.
///
/// The car module exposes a serial-over-GATT service in the standard
/// Bluetooth base UUID space (the `FFE0` family used by HM-10 style
/// controller boards).
pub const CAR_SERVICE_UUID: &str = "0000ffe0-0000-1000-8000-00805f9b34fb";

/// Move characteristic UUID - drive commands are written here
pub const CAR_MOVE_CHAR_UUID: &str = "0000ffe1-0000-1000-8000-00805f9b34fb";

/// Sound characteristic UUID - horn/sound commands are written here
pub const CAR_SOUND_CHAR_UUID: &str = "0000ffe2-0000-1000-8000-00805f9b34fb";

/// Parse a configured UUID string into its canonical form.
pub fn parse_uuid(uuid_str: &str) -> Result<Uuid, LinkError> {
    Uuid::parse_str(uuid_str).map_err(|_| LinkError::InvalidUuid(uuid_str.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let uuid = parse_uuid(CAR_SERVICE_UUID).unwrap();
        assert_eq!(
            uuid.hyphenated().to_string(),
            "0000ffe0-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        let err = parse_uuid("not-a-uuid").unwrap_err();
        assert!(matches!(err, LinkError::InvalidUuid(_)));
    }

    #[test]
    fn test_characteristics_live_in_the_car_service_family() {
        let service = parse_uuid(CAR_SERVICE_UUID).unwrap();
        let move_char = parse_uuid(CAR_MOVE_CHAR_UUID).unwrap();
        let sound_char = parse_uuid(CAR_SOUND_CHAR_UUID).unwrap();
        assert_ne!(move_char, sound_char);
        assert_ne!(service, move_char);
    }
}
