//! Session state machine
//!
//! Voice: `Disconnected -> Connecting -> Connected`, composed with an
//! independent network flag. The machine is long-lived and cycles for the
//! whole process lifetime.
//!
//! Transitions are driven only by command outcomes (connect accepted or
//! rejected) and by engine notifications. Each transition method reports
//! whether anything changed so the caller can decide what to emit.

use afv_protocol::UNSET_FREQUENCY_HZ;
use tracing::{debug, info};

use crate::error::CommandError;
use crate::state::{Session, VoiceState};

#[derive(Debug, Default)]
pub struct SessionStateMachine {
    session: Session,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn voice(&self) -> VoiceState {
        self.session.voice
    }

    /// Check whether a connect attempt may start
    pub fn check_can_connect(&self) -> Result<(), CommandError> {
        if self.session.voice != VoiceState::Disconnected {
            return Err(CommandError::AlreadyConnected);
        }
        if !self.session.network_connected {
            return Err(CommandError::NetworkUnavailable);
        }
        Ok(())
    }

    /// Connect accepted by the engine
    pub fn connect_accepted(&mut self) -> bool {
        self.set_voice(VoiceState::Connecting)
    }

    /// Connect rejected; fall back to disconnected
    pub fn connect_rejected(&mut self) -> bool {
        self.set_voice(VoiceState::Disconnected)
    }

    /// Voice connected notification from any state
    ///
    /// Returns the callsign whose station metadata should be requested, if we
    /// are a controller position.
    pub fn voice_connected(&mut self) -> Option<String> {
        self.set_voice(VoiceState::Connected);
        if self.session.is_atc && !self.session.callsign.is_empty() {
            Some(self.session.callsign.clone())
        } else {
            None
        }
    }

    /// Voice disconnected notification from any state
    pub fn voice_disconnected(&mut self) -> bool {
        self.set_voice(VoiceState::Disconnected)
    }

    /// Network login detected
    pub fn network_connected(&mut self, callsign: &str, is_atc: bool, frequency_hz: u32) {
        info!(
            "Network connected as {} ({}, {} Hz)",
            callsign,
            if is_atc { "ATC" } else { "pilot" },
            frequency_hz
        );
        self.session.network_connected = true;
        self.session.callsign = callsign.to_string();
        self.session.is_atc = is_atc;
        self.session.primary_frequency_hz = frequency_hz;
    }

    /// Network login lost
    ///
    /// Clears identity and resets the frequency to the unset sentinel
    /// regardless of prior state. Voice cannot outlive the network login, so
    /// it drops to disconnected too. Radio gain is a user preference and is
    /// kept.
    pub fn network_disconnected(&mut self) {
        info!("Network disconnected");
        self.session.network_connected = false;
        self.session.callsign.clear();
        self.session.is_atc = false;
        self.session.primary_frequency_hz = UNSET_FREQUENCY_HZ;
        self.session.voice = VoiceState::Disconnected;
    }

    /// Record the applied radio gain
    pub fn set_gain(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.session.radio_gain_percent == percent {
            return false;
        }
        self.session.radio_gain_percent = percent;
        true
    }

    fn set_voice(&mut self, voice: VoiceState) -> bool {
        if self.session.voice == voice {
            return false;
        }
        debug!(
            "Voice state {} -> {}",
            self.session.voice.name(),
            voice.name()
        );
        self.session.voice = voice;
        true
    }
}
