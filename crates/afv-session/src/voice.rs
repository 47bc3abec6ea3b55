//! Voice engine boundary
//!
//! The voice engine owns audio I/O and voice network connectivity. This crate
//! only sees it through the [`VoiceEngine`] trait: a set of quick, synchronous
//! imperative calls plus one registered callback that delivers raw
//! `(kind, arg1, arg2)` event triples from an engine-owned thread.

use afv_protocol::HardwareType;
use serde::{Deserialize, Serialize};

/// Raw event callback installed on the engine
pub type EngineCallback = Box<dyn Fn(&str, &str, &str) + Send + Sync>;

/// Per-frequency configuration as understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrequencyState {
    /// Receive enabled
    pub rx: bool,
    /// Transmit enabled
    pub tx: bool,
    /// Cross-couple enabled
    pub xc: bool,
    /// Route audio to the speaker device instead of the headset
    pub on_speaker: bool,
    /// Cross-couple across all transmit-enabled frequencies
    pub cross_couple_across: bool,
}

impl FrequencyState {
    /// Receive-only state
    pub fn rx_only() -> Self {
        Self {
            rx: true,
            ..Default::default()
        }
    }

    /// Receive and transmit
    pub fn rx_tx() -> Self {
        Self {
            rx: true,
            tx: true,
            ..Default::default()
        }
    }
}

/// Audio device selection handed to the engine before connecting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Audio API index (-1 = engine default)
    pub api: i32,
    /// Input (microphone) device id
    pub input_device_id: String,
    /// Headset output device id
    pub headset_device_id: String,
    /// Speaker output device id
    pub speaker_device_id: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            api: -1,
            input_device_id: String::new(),
            headset_device_id: String::new(),
            speaker_device_id: String::new(),
        }
    }
}

/// Imperative command surface of the voice engine
///
/// Every call is expected to return quickly; none of them wait on the
/// network. Implementations must be callable from any thread.
pub trait VoiceEngine: Send + Sync {
    /// Install the single event callback
    fn register_callback(&self, callback: EngineCallback);

    /// Start a voice connection. Returns whether the attempt was accepted.
    fn connect(&self, password: &str) -> bool;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Returns whether the frequency was accepted
    fn add_frequency(&self, frequency_hz: u32, callsign: &str) -> bool;

    fn remove_frequency(&self, frequency_hz: u32);

    /// Returns whether the new state was accepted
    fn set_frequency_state(&self, frequency_hz: u32, state: FrequencyState) -> bool;

    fn get_frequency_state(&self, frequency_hz: u32) -> FrequencyState;

    fn is_frequency_active(&self, frequency_hz: u32) -> bool;

    /// Gain on a 0.0..=1.0 scale
    fn set_radio_gain(&self, gain: f32);

    fn set_hardware_type(&self, kind: HardwareType);

    fn set_audio_settings(&self, settings: &AudioSettings);

    fn set_cid(&self, cid: &str);

    fn set_ptt(&self, active: bool);

    /// Ask for station metadata; answered with `StationDataReceived` events
    fn get_station(&self, callsign: &str);

    /// Ask the engine to refresh cached station metadata
    fn refresh_station(&self, callsign: &str);

    fn start_mic_test(&self);

    fn stop_mic_test(&self);

    fn version(&self) -> String;

    /// Release engine resources. Called once on shutdown.
    fn exit(&self);
}
