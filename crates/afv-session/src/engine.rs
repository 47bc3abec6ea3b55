//! Session engine
//!
//! The single owner of [`Session`] and [`RadioRegistry`] state. User commands
//! and decoded engine events both end up here, one at a time, so two updates
//! for the same frequency can never interleave. The engine is synchronous;
//! the actor in [`crate::actor`] provides the serialization point.
//!
//! Every state change is recorded as a [`SessionEvent`] in an internal buffer
//! that the owner drains after each step.

use std::sync::Arc;

use afv_protocol::{EngineEvent, HardwareType, UNSET_FREQUENCY_HZ};
use tracing::{debug, info, warn};

use crate::demux::{route, RadioNotification, Routed, SessionNotification};
use crate::dispatcher::CommandDispatcher;
use crate::error::CommandError;
use crate::events::SessionEvent;
use crate::registry::RadioRegistry;
use crate::session::SessionStateMachine;
use crate::state::{Radio, Session, SessionSnapshot, VoiceState};
use crate::voice::FrequencyState;

/// Session and radio state plus the dispatcher used to act on it
pub struct SessionEngine {
    dispatcher: Arc<CommandDispatcher>,
    machine: SessionStateMachine,
    registry: RadioRegistry,
    event_buffer: Vec<SessionEvent>,
}

impl SessionEngine {
    pub fn new(dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            dispatcher,
            machine: SessionStateMachine::new(),
            registry: RadioRegistry::new(),
            event_buffer: Vec::new(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    pub fn session(&self) -> &Session {
        self.machine.session()
    }

    pub fn registry(&self) -> &RadioRegistry {
        &self.registry
    }

    /// Get a radio by frequency
    pub fn radio(&self, frequency_hz: u32) -> Option<&Radio> {
        self.registry.get(frequency_hz)
    }

    /// Clone the current state for polling observers
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.machine.session().clone(),
            radios: self.registry.snapshot(),
        }
    }

    /// Drain buffered events
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Start a voice connection
    ///
    /// Missing credentials are reported before anything else and never reach
    /// the engine. On accept the session moves to `Connecting`; `Connected`
    /// only follows from the engine's `VoiceConnected` event.
    pub fn connect(&mut self) -> Result<(), CommandError> {
        if !self.dispatcher.has_credentials() {
            return Err(self.reject("Connect", CommandError::MissingCredentials));
        }
        if let Err(e) = self.machine.check_can_connect() {
            return Err(self.reject("Connect", e));
        }

        match self.dispatcher.connect() {
            Ok(()) => {
                if self.machine.connect_accepted() {
                    self.voice_state_changed();
                }
                Ok(())
            }
            Err(e) => {
                if self.machine.connect_rejected() {
                    self.voice_state_changed();
                }
                Err(self.reject("Connect", e))
            }
        }
    }

    /// Ask the engine to drop the voice connection
    ///
    /// State is only reset when the engine reports `VoiceDisconnected`.
    pub fn disconnect(&mut self) -> Result<(), CommandError> {
        if self.machine.voice() == VoiceState::Disconnected {
            return Err(self.reject("Disconnect", CommandError::NotConnected));
        }
        self.dispatcher.disconnect();
        Ok(())
    }

    /// Add a frequency and create its radio once the engine accepts it
    pub fn add_frequency(
        &mut self,
        frequency_hz: u32,
        callsign: &str,
    ) -> Result<Radio, CommandError> {
        if !self.machine.session().voice_connected() {
            return Err(self.reject("Add frequency", CommandError::NotConnected));
        }
        if self.registry.contains(frequency_hz) {
            return Err(self.reject(
                "Add frequency",
                CommandError::DuplicateFrequency(frequency_hz),
            ));
        }
        if let Err(e) = self.dispatcher.add_frequency(frequency_hz, callsign) {
            return Err(self.reject("Add frequency", e));
        }

        self.insert_radio(frequency_hz, callsign)
    }

    /// Remove a frequency from the engine and the registry
    pub fn remove_frequency(&mut self, frequency_hz: u32) -> Result<(), CommandError> {
        if !self.registry.contains(frequency_hz) {
            return Err(self.reject(
                "Remove frequency",
                CommandError::FrequencyNotFound(frequency_hz),
            ));
        }

        self.dispatcher.remove_frequency(frequency_hz);
        self.registry.remove_radio(frequency_hz);
        self.event_buffer
            .push(SessionEvent::RadioRemoved { frequency_hz });
        info!("Removed frequency {}", frequency_hz);
        Ok(())
    }

    /// Change a radio's rx/tx/xc/speaker flags
    ///
    /// The registry only mirrors the new flags after the engine accepted them.
    pub fn set_frequency_state(
        &mut self,
        frequency_hz: u32,
        state: FrequencyState,
    ) -> Result<Radio, CommandError> {
        if !self.registry.contains(frequency_hz) {
            return Err(self.reject(
                "Frequency state",
                CommandError::FrequencyNotFound(frequency_hz),
            ));
        }
        if let Err(e) = self.dispatcher.set_frequency_state(frequency_hz, state) {
            return Err(self.reject("Frequency state", e));
        }

        match self.registry.set_radio_state(frequency_hz, state) {
            Ok(radio) => {
                let radio = radio.clone();
                self.event_buffer.push(SessionEvent::RadioUpdated {
                    radio: radio.clone(),
                });
                Ok(radio)
            }
            Err(e) => Err(self.reject("Frequency state", e)),
        }
    }

    /// Apply radio gain in percent; returns the clamped value
    pub fn set_gain(&mut self, percent: u8) -> u8 {
        let applied = self.dispatcher.set_gain(percent);
        if self.machine.set_gain(applied) {
            self.event_buffer
                .push(SessionEvent::GainChanged { percent: applied });
        }
        applied
    }

    pub fn set_hardware_type(&mut self, kind: HardwareType) {
        info!("Hardware type set to {}", kind.name());
        self.dispatcher.set_hardware_type(kind);
    }

    pub fn start_mic_test(&mut self) {
        info!("Mic test started");
        self.dispatcher.start_mic_test();
    }

    /// Stop the mic test, resetting observers' level display first
    pub fn stop_mic_test(&mut self) {
        self.event_buffer
            .push(SessionEvent::MicLevel { vu: 0.0, peak: 0.0 });
        self.dispatcher.stop_mic_test();
        info!("Mic test stopped");
    }

    /// Request station metadata; the answer arrives as engine events
    pub fn request_station(&mut self, callsign: &str) -> Result<(), CommandError> {
        if !self.machine.session().voice_connected() {
            return Err(self.reject("Station lookup", CommandError::NotConnected));
        }
        self.dispatcher.get_station(callsign);
        Ok(())
    }

    /// Ask the engine to refresh station metadata
    pub fn refresh_station(&mut self, callsign: &str) -> Result<(), CommandError> {
        if !self.machine.session().voice_connected() {
            return Err(self.reject("Station lookup", CommandError::NotConnected));
        }
        self.dispatcher.refresh_station(callsign);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Engine events
    // -------------------------------------------------------------------------

    /// Apply one decoded engine event
    pub fn apply_engine_event(&mut self, event: EngineEvent) {
        match route(event) {
            Routed::Session(notification) => self.apply_session(notification),
            Routed::Registry(notification) => self.apply_registry(notification),
        }
    }

    fn apply_session(&mut self, notification: SessionNotification) {
        match notification {
            SessionNotification::VoiceConnected => {
                let before = self.machine.voice();
                let station = self.machine.voice_connected();
                if before != VoiceState::Connected {
                    info!("Voice connected");
                    self.voice_state_changed();
                }
                if let Some(callsign) = station {
                    self.dispatcher.get_station(&callsign);
                }
            }

            SessionNotification::VoiceDisconnected => {
                if self.machine.voice_disconnected() {
                    info!("Voice disconnected");
                    self.voice_state_changed();
                }
                self.clear_radios();
            }

            SessionNotification::NetworkConnected {
                callsign,
                is_atc,
                frequency_hz,
            } => {
                self.machine
                    .network_connected(&callsign, is_atc, frequency_hz);
                self.event_buffer.push(SessionEvent::NetworkStateChanged {
                    connected: true,
                    callsign,
                    is_atc,
                    frequency_hz,
                });
            }

            SessionNotification::NetworkDisconnected => {
                let before = self.machine.voice();
                self.machine.network_disconnected();
                if before != VoiceState::Disconnected {
                    self.voice_state_changed();
                }
                self.clear_radios();
                self.event_buffer.push(SessionEvent::NetworkStateChanged {
                    connected: false,
                    callsign: String::new(),
                    is_atc: false,
                    frequency_hz: UNSET_FREQUENCY_HZ,
                });
            }

            SessionNotification::MicTestLevel { vu, peak } => {
                self.event_buffer.push(SessionEvent::MicLevel { vu, peak });
            }

            SessionNotification::EngineError { message } => {
                warn!("Voice engine error: {}", message);
                self.event_buffer
                    .push(SessionEvent::error("Voice engine", message));
            }
        }
    }

    fn apply_registry(&mut self, notification: RadioNotification) {
        match notification {
            RadioNotification::RxBegin { frequency_hz } => {
                if self.registry.set_receiving(frequency_hz, true) {
                    self.radio_updated(frequency_hz);
                }
            }

            RadioNotification::RxEnd { frequency_hz } => {
                if self.registry.set_receiving(frequency_hz, false) {
                    self.radio_updated(frequency_hz);
                }
            }

            RadioNotification::StationRxBegin {
                frequency_hz,
                callsign,
            } => {
                if self.registry.set_last_heard(frequency_hz, &callsign) {
                    self.radio_updated(frequency_hz);
                }
            }

            RadioNotification::TransceiversUpdated { station, count } => {
                for frequency_hz in self.registry.set_transceiver_count(&station, count) {
                    self.radio_updated(frequency_hz);
                }
            }

            RadioNotification::StationData {
                station,
                frequency_hz,
            } => self.station_data_received(&station, frequency_hz),

            RadioNotification::PttState { active } => {
                for frequency_hz in self.registry.set_transmitting(active) {
                    self.radio_updated(frequency_hz);
                }
                self.event_buffer
                    .push(SessionEvent::TransmitStateChanged { active });
            }
        }
    }

    /// Station lookup resolved: add the frequency unless we already have it
    fn station_data_received(&mut self, station: &str, frequency_hz: u32) {
        if !self.machine.session().voice_connected() {
            debug!(
                "Ignoring station data for {} while voice is not connected",
                station
            );
            return;
        }
        if self.registry.contains(frequency_hz) {
            debug!("Station {} already on {} Hz", station, frequency_hz);
            return;
        }

        if let Err(e) = self.dispatcher.add_frequency(frequency_hz, station) {
            self.reject("Station data", e);
            return;
        }
        if self.insert_radio(frequency_hz, station).is_ok() {
            // New frequencies start at the engine default gain
            let gain = self.machine.session().radio_gain_percent;
            self.dispatcher.set_gain(gain);
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn insert_radio(&mut self, frequency_hz: u32, callsign: &str) -> Result<Radio, CommandError> {
        let self_callsign = self.machine.session().callsign.clone();
        match self.registry.add_radio(frequency_hz, callsign, &self_callsign) {
            Ok(radio) => {
                let radio = radio.clone();
                info!(
                    "Added frequency {} ({})",
                    radio.frequency_display(),
                    radio.station_callsign
                );
                self.event_buffer.push(SessionEvent::RadioAdded {
                    radio: radio.clone(),
                });
                Ok(radio)
            }
            Err(e) => Err(self.reject("Add frequency", e)),
        }
    }

    fn clear_radios(&mut self) {
        if self.registry.reset() > 0 {
            self.event_buffer.push(SessionEvent::RadiosCleared);
        }
    }

    fn radio_updated(&mut self, frequency_hz: u32) {
        if let Some(radio) = self.registry.get(frequency_hz) {
            self.event_buffer.push(SessionEvent::RadioUpdated {
                radio: radio.clone(),
            });
        }
    }

    fn voice_state_changed(&mut self) {
        self.event_buffer.push(SessionEvent::VoiceStateChanged {
            state: self.machine.voice(),
        });
    }

    /// Surface a rejection to observers and hand the error back
    fn reject(&mut self, source: &str, error: CommandError) -> CommandError {
        warn!("{} rejected: {}", source, error);
        self.event_buffer
            .push(SessionEvent::error(source, error.to_string()));
        error
    }
}
