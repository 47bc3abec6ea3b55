//! Application settings

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use afv_protocol::{HardwareType, KeyCode};
use afv_session::{AudioSettings, BindingStore, PttSlot, DEFAULT_GAIN_PERCENT};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Network user id
    #[serde(default)]
    pub cid: String,
    /// Network password
    #[serde(default)]
    pub password: String,
    /// Audio API index (-1 = engine default)
    #[serde(default = "default_audio_api")]
    pub audio_api: i32,
    /// Microphone device id
    #[serde(default)]
    pub audio_input_device_id: String,
    /// Headset output device id
    #[serde(default)]
    pub headset_output_device_id: String,
    /// Speaker output device id
    #[serde(default)]
    pub speaker_output_device_id: String,
    /// Hardware profile index (unknown values fall back to 0)
    #[serde(default)]
    pub hardware_type: i32,
    /// First PTT key (0 = unbound)
    #[serde(default)]
    pub ptt_key_1: u32,
    /// Second PTT key (0 = unbound)
    #[serde(default)]
    pub ptt_key_2: u32,
    /// Radio gain in percent
    #[serde(default = "default_radio_gain")]
    pub radio_gain: u8,
    /// Keep the window above others
    #[serde(default)]
    pub always_on_top: bool,
}

fn default_audio_api() -> i32 {
    -1
}

fn default_radio_gain() -> u8 {
    DEFAULT_GAIN_PERCENT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cid: String::new(),
            password: String::new(),
            audio_api: -1,
            audio_input_device_id: String::new(),
            headset_output_device_id: String::new(),
            speaker_output_device_id: String::new(),
            hardware_type: 0,
            ptt_key_1: 0,
            ptt_key_2: 0,
            radio_gain: DEFAULT_GAIN_PERCENT,
            always_on_top: false,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for afvlink
    /// Uses $XDG_CONFIG_HOME/afvlink on Linux/macOS, falls back to ~/.config/afvlink
    fn config_dir() -> Option<PathBuf> {
        // First try XDG_CONFIG_HOME environment variable
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("afvlink"));
            }
        }

        // Fall back to ~/.config/afvlink (XDG default)
        dirs::home_dir().map(|h| h.join(".config").join("afvlink"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file, defaulting on any error
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;
        self.save_to(&path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    /// Audio device selection for the engine
    pub fn audio_settings(&self) -> AudioSettings {
        AudioSettings {
            api: self.audio_api,
            input_device_id: self.audio_input_device_id.clone(),
            headset_device_id: self.headset_output_device_id.clone(),
            speaker_device_id: self.speaker_output_device_id.clone(),
        }
    }

    /// Hardware profile, falling back to the default for unknown indices
    pub fn hardware(&self) -> HardwareType {
        HardwareType::from_index(self.hardware_type).unwrap_or_default()
    }

    pub fn ptt_key(&self, slot: PttSlot) -> KeyCode {
        match slot {
            PttSlot::One => KeyCode(self.ptt_key_1),
            PttSlot::Two => KeyCode(self.ptt_key_2),
        }
    }

    pub fn set_ptt_key(&mut self, slot: PttSlot, key: KeyCode) {
        match slot {
            PttSlot::One => self.ptt_key_1 = key.as_u32(),
            PttSlot::Two => self.ptt_key_2 = key.as_u32(),
        }
    }
}

/// Shared settings that save themselves on every change
///
/// Also the persistence behind the PTT key bindings.
pub struct SettingsStore {
    settings: Mutex<Settings>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Load from the default location
    pub fn load() -> Self {
        let path = Settings::settings_path();
        let settings = path
            .as_deref()
            .map(Settings::load_from)
            .unwrap_or_default();
        Self {
            settings: Mutex::new(settings),
            path,
        }
    }

    /// Load from (and save to) a specific file
    pub fn at(path: PathBuf) -> Self {
        Self {
            settings: Mutex::new(Settings::load_from(&path)),
            path: Some(path),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current settings
    pub fn get(&self) -> Settings {
        self.lock().clone()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Change settings and save if anything changed
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<(), String> {
        let updated = {
            let mut settings = self.lock();
            let previous = settings.clone();
            change(&mut settings);
            if *settings == previous {
                return Ok(());
            }
            settings.clone()
        };

        let path = self
            .path
            .as_deref()
            .ok_or_else(|| "Could not determine settings path".to_string())?;
        updated.save_to(path)
    }
}

impl BindingStore for SettingsStore {
    fn load(&self, slot: PttSlot) -> KeyCode {
        self.lock().ptt_key(slot)
    }

    fn store(&self, slot: PttSlot, key: KeyCode) -> Result<(), String> {
        self.update(|s| s.set_ptt_key(slot, key)).inspect_err(|e| {
            warn!("Could not save {} binding: {}", slot, e);
        })
    }
}
