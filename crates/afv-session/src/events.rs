//! Observer notifications
//!
//! Every change to session or radio state is reported through a single
//! [`SessionEvent`] stream, so a UI only has to drain one channel to stay in
//! sync. The user-facing error surface is part of the same stream.

use crate::state::{Radio, VoiceState};

/// Unified notification enum for session activity
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------
    /// Voice connection state changed
    VoiceStateChanged {
        /// New state
        state: VoiceState,
    },

    /// Network login state changed
    NetworkStateChanged {
        connected: bool,
        callsign: String,
        is_atc: bool,
        frequency_hz: u32,
    },

    /// Radio gain applied
    GainChanged {
        /// Gain in percent
        percent: u8,
    },

    /// Microphone test levels, 0..=100
    MicLevel { vu: f32, peak: f32 },

    // -------------------------------------------------------------------------
    // Radios
    // -------------------------------------------------------------------------
    /// A radio was added to the registry
    RadioAdded { radio: Radio },

    /// A radio's flags or activity changed
    RadioUpdated { radio: Radio },

    /// A radio was removed
    RadioRemoved { frequency_hz: u32 },

    /// All radios were removed at once (disconnect)
    RadiosCleared,

    /// Global transmit state reported by the engine
    TransmitStateChanged { active: bool },

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------
    /// Something the user should see
    Error {
        /// Where it came from (e.g. "Connect", "Voice engine")
        source: String,
        /// Error message
        message: String,
    },
}

impl SessionEvent {
    /// Check if this event concerns the radio registry
    pub fn is_radio_event(&self) -> bool {
        matches!(
            self,
            SessionEvent::RadioAdded { .. }
                | SessionEvent::RadioUpdated { .. }
                | SessionEvent::RadioRemoved { .. }
                | SessionEvent::RadiosCleared
        )
    }

    /// Check if this event is for the error surface
    pub fn is_error(&self) -> bool {
        matches!(self, SessionEvent::Error { .. })
    }

    /// Get the frequency if this event is associated with a specific radio
    pub fn frequency_hz(&self) -> Option<u32> {
        match self {
            SessionEvent::RadioAdded { radio } | SessionEvent::RadioUpdated { radio } => {
                Some(radio.frequency_hz)
            }
            SessionEvent::RadioRemoved { frequency_hz } => Some(*frequency_hz),
            _ => None,
        }
    }

    pub(crate) fn error(source: &str, message: impl Into<String>) -> Self {
        SessionEvent::Error {
            source: source.to_string(),
            message: message.into(),
        }
    }
}
