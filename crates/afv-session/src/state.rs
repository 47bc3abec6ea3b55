//! Session and radio state

use afv_protocol::{format_frequency, UNSET_FREQUENCY_HZ};
use serde::{Deserialize, Serialize};

use crate::voice::FrequencyState;

/// Default radio gain in percent
pub const DEFAULT_GAIN_PERCENT: u8 = 50;

/// Voice connection state
///
/// A single enum rather than two flags, so "connecting" and "connected" can
/// never be true at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VoiceState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl VoiceState {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        }
    }
}

/// Process-wide session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Network login detected for our position
    pub network_connected: bool,
    /// Voice connection state
    pub voice: VoiceState,
    /// Logged in as a controller position
    pub is_atc: bool,
    /// Our own callsign (empty while network is disconnected)
    pub callsign: String,
    /// Primary frequency of our position, or the unset sentinel
    pub primary_frequency_hz: u32,
    /// Radio gain, 0..=100
    pub radio_gain_percent: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            network_connected: false,
            voice: VoiceState::Disconnected,
            is_atc: false,
            callsign: String::new(),
            primary_frequency_hz: UNSET_FREQUENCY_HZ,
            radio_gain_percent: DEFAULT_GAIN_PERCENT,
        }
    }
}

impl Session {
    pub fn voice_connected(&self) -> bool {
        self.voice == VoiceState::Connected
    }

    pub fn voice_connecting(&self) -> bool {
        self.voice == VoiceState::Connecting
    }

    /// Whether the connect affordance should be enabled
    pub fn can_connect(&self) -> bool {
        self.network_connected && self.voice == VoiceState::Disconnected
    }
}

/// A monitored frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Radio {
    /// Frequency in Hz; identity within the registry
    pub frequency_hz: u32,
    /// Station this frequency belongs to
    pub station_callsign: String,
    /// Receive enabled
    pub rx: bool,
    /// Transmit enabled
    pub tx: bool,
    /// Cross-couple enabled
    pub xc: bool,
    /// Audio routed to speaker
    pub on_speaker: bool,
    /// Cross-couple across
    pub cross_couple_across: bool,
    /// Audio currently being received
    pub currently_receiving: bool,
    /// We are currently transmitting on this frequency
    pub currently_transmitting: bool,
    /// Last callsign heard on this frequency
    pub last_heard_callsign: String,
    /// Number of transceivers backing the station
    pub transceiver_count: u32,
    /// Station is our own position
    pub primary: bool,
}

impl Radio {
    /// Create a new radio with everything disabled
    pub fn new(frequency_hz: u32, station_callsign: String, primary: bool) -> Self {
        Self {
            frequency_hz,
            station_callsign,
            rx: false,
            tx: false,
            xc: false,
            on_speaker: false,
            cross_couple_across: false,
            currently_receiving: false,
            currently_transmitting: false,
            last_heard_callsign: String::new(),
            transceiver_count: 0,
            primary,
        }
    }

    /// Neither receive nor transmit is enabled
    pub fn is_inactive(&self) -> bool {
        !self.rx && !self.tx
    }

    /// Current configuration as engine frequency state
    pub fn frequency_state(&self) -> FrequencyState {
        FrequencyState {
            rx: self.rx,
            tx: self.tx,
            xc: self.xc,
            on_speaker: self.on_speaker,
            cross_couple_across: self.cross_couple_across,
        }
    }

    /// Format frequency for display
    pub fn frequency_display(&self) -> String {
        format_frequency(self.frequency_hz)
    }
}

/// Point-in-time copy of all state, for polling observers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Session,
    /// Radios ordered by frequency
    pub radios: Vec<Radio>,
}

impl SessionSnapshot {
    /// Find a radio by frequency
    pub fn radio(&self, frequency_hz: u32) -> Option<&Radio> {
        self.radios.iter().find(|r| r.frequency_hz == frequency_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let session = Session::default();
        assert!(!session.network_connected);
        assert_eq!(session.voice, VoiceState::Disconnected);
        assert_eq!(session.primary_frequency_hz, UNSET_FREQUENCY_HZ);
        assert_eq!(session.radio_gain_percent, DEFAULT_GAIN_PERCENT);
        assert!(!session.can_connect());
    }

    #[test]
    fn test_new_radio_is_inactive() {
        let radio = Radio::new(121_500_000, "EGLL_TWR".to_string(), false);
        assert!(radio.is_inactive());
        assert!(!radio.currently_receiving);
        assert_eq!(radio.frequency_display(), "121.500 MHz");
        assert_eq!(radio.frequency_state(), FrequencyState::default());
    }
}
