use crate::infrastructure::bluetooth::{manager::LinkConfig, protocol};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "rccar_link".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub known_peripheral_addresses: Vec<String>,
    pub last_connected_address: Option<String>,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // Advanced BLE Settings
    #[serde(default = "default_service_uuid")]
    pub ble_service_uuid: String,
    #[serde(default = "default_move_uuid")]
    pub ble_move_char_uuid: String,
    #[serde(default = "default_sound_uuid")]
    pub ble_sound_char_uuid: String,

    /// Publish a `DiscoveryFailed` event when service discovery fails.
    /// Off by default: a failed discovery is otherwise only logged.
    #[serde(default = "default_false")]
    pub emit_discovery_failed: bool,

    /// Capacity of the observer event channel.
    #[serde(default = "default_event_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            known_peripheral_addresses: Vec::new(),
            last_connected_address: None,
            log_settings: LogSettings::default(),

            // Advanced BLE Settings
            ble_service_uuid: default_service_uuid(),
            ble_move_char_uuid: default_move_uuid(),
            ble_sound_char_uuid: default_sound_uuid(),
            emit_discovery_failed: false,
            event_channel_capacity: default_event_capacity(),
        }
    }
}

fn default_service_uuid() -> String {
    protocol::CAR_SERVICE_UUID.to_string()
}
fn default_move_uuid() -> String {
    protocol::CAR_MOVE_CHAR_UUID.to_string()
}
fn default_sound_uuid() -> String {
    protocol::CAR_SOUND_CHAR_UUID.to_string()
}
fn default_event_capacity() -> usize {
    16
}

impl Settings {
    /// Build the runtime link configuration from the persisted settings.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            service_uuid: self.ble_service_uuid.clone(),
            move_char_uuid: self.ble_move_char_uuid.clone(),
            sound_char_uuid: self.ble_sound_char_uuid.clone(),
            emit_discovery_failed: self.emit_discovery_failed,
            event_channel_capacity: self.event_channel_capacity,
        }
    }
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("RcCarLink");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn add_known_address(&mut self, address: &str) -> anyhow::Result<()> {
        if !self
            .settings
            .known_peripheral_addresses
            .iter()
            .any(|a| a == address)
        {
            self.settings
                .known_peripheral_addresses
                .push(address.to_string());
            self.save()?;
        }
        Ok(())
    }

    pub fn set_last_connected(&mut self, address: &str) -> anyhow::Result<()> {
        self.settings.last_connected_address = Some(address.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_car_profile() {
        let settings = Settings::default();
        assert_eq!(settings.ble_service_uuid, protocol::CAR_SERVICE_UUID);
        assert_eq!(settings.ble_move_char_uuid, protocol::CAR_MOVE_CHAR_UUID);
        assert_eq!(settings.ble_sound_char_uuid, protocol::CAR_SOUND_CHAR_UUID);
        assert!(!settings.emit_discovery_failed);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        // Older settings files only carried the address book.
        let json = r#"{"known_peripheral_addresses":["AA:BB:CC:DD:EE:FF"],"last_connected_address":null}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.known_peripheral_addresses.len(), 1);
        assert_eq!(settings.ble_service_uuid, protocol::CAR_SERVICE_UUID);
        assert_eq!(settings.event_channel_capacity, 16);
        assert_eq!(settings.log_settings.level, "info");
    }

    #[test]
    fn settings_roundtrip_through_json() {
        let mut settings = Settings::default();
        settings.emit_discovery_failed = true;
        settings.last_connected_address = Some("AA:BB".to_string());

        let json = serde_json::to_string(&settings).unwrap();
        let restored: Settings = serde_json::from_str(&json).unwrap();
        assert!(restored.emit_discovery_failed);
        assert_eq!(restored.last_connected_address.as_deref(), Some("AA:BB"));
    }
}
