//! Simulated voice engine
//!
//! Accepts the same imperative calls as the native engine, keeps just enough
//! state to answer them plausibly, and reports back through the registered
//! callback using the engine's string wire format.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use afv_protocol::{format_frequency, EngineEvent, HardwareType};
use afv_session::{AudioSettings, EngineCallback, FrequencyState, VoiceEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A station the simulated engine can resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStation {
    /// Station callsign
    pub callsign: String,
    /// Frequencies reported by a station lookup
    pub frequencies_hz: Vec<u32>,
    /// Transceiver count reported after the lookup (0 = none reported)
    pub transceivers: u32,
}

/// Configuration for a simulated engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedEngineConfig {
    /// Reported engine version
    pub version: String,
    /// Report VoiceConnected/VoiceDisconnected right after connect/disconnect
    pub auto_voice_events: bool,
    /// Decline every connect
    pub reject_connect: bool,
    /// Decline every add/set frequency call
    pub reject_frequencies: bool,
    /// Stations known to station lookups
    pub stations: Vec<SimStation>,
}

impl Default for SimulatedEngineConfig {
    fn default() -> Self {
        Self {
            version: concat!("afv-sim/", env!("CARGO_PKG_VERSION")).to_string(),
            auto_voice_events: true,
            reject_connect: false,
            reject_frequencies: false,
            stations: Vec::new(),
        }
    }
}

/// A call received by the simulated engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Connect,
    Disconnect,
    AddFrequency(u32, String),
    RemoveFrequency(u32),
    SetFrequencyState(u32, FrequencyState),
    SetRadioGain(f32),
    SetHardwareType(HardwareType),
    SetAudioSettings(AudioSettings),
    SetCid(String),
    SetPtt(bool),
    GetStation(String),
    RefreshStation(String),
    StartMicTest,
    StopMicTest,
    Exit,
}

#[derive(Debug, Clone)]
struct SimFrequency {
    callsign: String,
    state: FrequencyState,
}

#[derive(Debug, Default)]
struct SimState {
    voice_connected: bool,
    network: Option<(String, bool, u32)>,
    frequencies: HashMap<u32, SimFrequency>,
    gain: f32,
    hardware: HardwareType,
    cid: String,
    ptt: bool,
    mic_test: bool,
    calls: Vec<EngineCall>,
}

/// In-process stand-in for the native voice engine
pub struct SimulatedEngine {
    config: Mutex<SimulatedEngineConfig>,
    state: Mutex<SimState>,
    callback: Mutex<Option<EngineCallback>>,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEngine {
    /// Create a simulated engine with default settings
    pub fn new() -> Self {
        Self::from_config(SimulatedEngineConfig::default())
    }

    /// Create a simulated engine from configuration
    pub fn from_config(config: SimulatedEngineConfig) -> Self {
        Self {
            config: Mutex::new(config),
            state: Mutex::new(SimState {
                gain: 1.0,
                ..Default::default()
            }),
            callback: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn config(&self) -> MutexGuard<'_, SimulatedEngineConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Scenario control
    // -------------------------------------------------------------------------

    /// Decline future connect calls
    pub fn set_reject_connect(&self, reject: bool) {
        self.config().reject_connect = reject;
    }

    /// Decline future add/set frequency calls
    pub fn set_reject_frequencies(&self, reject: bool) {
        self.config().reject_frequencies = reject;
    }

    /// Make a station resolvable by lookups
    pub fn add_station(&self, station: SimStation) {
        let mut config = self.config();
        config.stations.retain(|s| s.callsign != station.callsign);
        config.stations.push(station);
    }

    /// Report a raw event triple exactly as given
    pub fn emit_raw(&self, kind: &str, arg1: &str, arg2: &str) {
        let callback = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cb) = callback.as_ref() {
            cb(kind, arg1, arg2);
        }
    }

    /// Report a decoded event through the wire format
    pub fn emit(&self, event: &EngineEvent) {
        let (kind, arg1, arg2) = event.to_wire();
        debug!("Simulated engine emits {} ({:?}, {:?})", kind, arg1, arg2);
        self.emit_raw(kind, &arg1, &arg2);
    }

    fn emit_all(&self, events: Vec<EngineEvent>) {
        for event in &events {
            self.emit(event);
        }
    }

    /// Simulate a network login for our position
    pub fn network_login(&self, callsign: &str, is_atc: bool, frequency_hz: u32) {
        self.state().network = Some((callsign.to_string(), is_atc, frequency_hz));
        self.emit(&EngineEvent::NetworkConnected {
            callsign: callsign.to_string(),
            is_atc,
            frequency_hz,
        });
    }

    /// Simulate losing the network login
    ///
    /// The voice connection goes with it.
    pub fn network_logout(&self) {
        let had_voice = {
            let mut state = self.state();
            state.network = None;
            let had_voice = state.voice_connected;
            state.voice_connected = false;
            state.frequencies.clear();
            state.ptt = false;
            had_voice
        };
        let mut events = Vec::new();
        if had_voice {
            events.push(EngineEvent::VoiceDisconnected);
        }
        events.push(EngineEvent::NetworkDisconnected);
        self.emit_all(events);
    }

    /// Report voice connected (for configs without auto voice events)
    pub fn voice_up(&self) {
        self.state().voice_connected = true;
        self.emit(&EngineEvent::VoiceConnected);
    }

    /// Simulate the voice connection dropping on the engine side
    pub fn voice_down(&self) {
        {
            let mut state = self.state();
            state.voice_connected = false;
            state.frequencies.clear();
            state.ptt = false;
        }
        self.emit(&EngineEvent::VoiceDisconnected);
    }

    /// Audio starts on a frequency
    pub fn rx_begin(&self, frequency_hz: u32) {
        self.emit(&EngineEvent::FrequencyRxBegin { frequency_hz });
    }

    /// Audio stops on a frequency
    pub fn rx_end(&self, frequency_hz: u32) {
        self.emit(&EngineEvent::FrequencyRxEnd { frequency_hz });
    }

    /// A callsign starts transmitting on a frequency
    pub fn station_rx_begin(&self, frequency_hz: u32, callsign: &str) {
        self.emit(&EngineEvent::StationRxBegin {
            frequency_hz,
            callsign: callsign.to_string(),
        });
    }

    /// Report an engine error
    pub fn report_error(&self, message: &str) {
        self.emit(&EngineEvent::Error {
            message: message.to_string(),
        });
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Calls received so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Frequencies currently known to the engine, sorted
    pub fn frequencies(&self) -> Vec<u32> {
        let mut freqs: Vec<u32> = self.state().frequencies.keys().copied().collect();
        freqs.sort_unstable();
        freqs
    }

    pub fn ptt(&self) -> bool {
        self.state().ptt
    }

    /// Last applied gain on the 0.0..=1.0 scale
    pub fn gain(&self) -> f32 {
        self.state().gain
    }

    pub fn hardware_type(&self) -> HardwareType {
        self.state().hardware
    }

    pub fn cid(&self) -> String {
        self.state().cid.clone()
    }

    pub fn mic_test_running(&self) -> bool {
        self.state().mic_test
    }

    /// Get a summary of current state
    pub fn state_summary(&self) -> String {
        let state = self.state();
        let mut freqs: Vec<(&u32, &SimFrequency)> = state.frequencies.iter().collect();
        freqs.sort_by_key(|(hz, _)| **hz);
        let freqs: Vec<String> = freqs
            .iter()
            .map(|(hz, f)| format!("{} {}", format_frequency(**hz), f.callsign))
            .collect();
        format!(
            "voice {} - {} frequencies [{}] {}",
            if state.voice_connected { "up" } else { "down" },
            freqs.len(),
            freqs.join(", "),
            if state.ptt { "[TX]" } else { "" }
        )
    }

    fn record(&self, call: EngineCall) {
        self.state().calls.push(call);
    }

    fn station_events(&self, callsign: &str) -> Vec<EngineEvent> {
        if !self.state().voice_connected {
            debug!("Station lookup for {} while voice is down", callsign);
            return Vec::new();
        }
        let config = self.config();
        let Some(station) = config.stations.iter().find(|s| s.callsign == callsign) else {
            debug!("Unknown station {}", callsign);
            return Vec::new();
        };

        let mut events: Vec<EngineEvent> = station
            .frequencies_hz
            .iter()
            .map(|&frequency_hz| EngineEvent::StationDataReceived {
                station: station.callsign.clone(),
                frequency_hz,
            })
            .collect();
        if station.transceivers > 0 {
            events.push(EngineEvent::StationTransceiversUpdated {
                station: station.callsign.clone(),
                count: station.transceivers,
            });
        }
        events
    }
}

impl VoiceEngine for SimulatedEngine {
    fn register_callback(&self, callback: EngineCallback) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn connect(&self, password: &str) -> bool {
        self.record(EngineCall::Connect);
        let (reject, auto) = {
            let config = self.config();
            (config.reject_connect, config.auto_voice_events)
        };

        let accepted = {
            let mut state = self.state();
            let ok = !reject && !password.is_empty() && state.network.is_some();
            if ok && auto {
                state.voice_connected = true;
            }
            ok
        };

        if accepted && auto {
            self.emit(&EngineEvent::VoiceConnected);
        }
        accepted
    }

    fn disconnect(&self) {
        self.record(EngineCall::Disconnect);
        let auto = self.config().auto_voice_events;
        let was_connected = {
            let mut state = self.state();
            let was = state.voice_connected;
            if auto {
                state.voice_connected = false;
                state.frequencies.clear();
                state.ptt = false;
            }
            was
        };
        if auto && was_connected {
            self.emit(&EngineEvent::VoiceDisconnected);
        }
    }

    fn is_connected(&self) -> bool {
        self.state().voice_connected
    }

    fn add_frequency(&self, frequency_hz: u32, callsign: &str) -> bool {
        self.record(EngineCall::AddFrequency(frequency_hz, callsign.to_string()));
        let reject = self.config().reject_frequencies;
        let mut state = self.state();
        if reject || !state.voice_connected || state.frequencies.contains_key(&frequency_hz) {
            return false;
        }
        state.frequencies.insert(
            frequency_hz,
            SimFrequency {
                callsign: callsign.to_string(),
                state: FrequencyState::default(),
            },
        );
        true
    }

    fn remove_frequency(&self, frequency_hz: u32) {
        self.record(EngineCall::RemoveFrequency(frequency_hz));
        self.state().frequencies.remove(&frequency_hz);
    }

    fn set_frequency_state(&self, frequency_hz: u32, state: FrequencyState) -> bool {
        self.record(EngineCall::SetFrequencyState(frequency_hz, state));
        let reject = self.config().reject_frequencies;
        if reject {
            return false;
        }
        match self.state().frequencies.get_mut(&frequency_hz) {
            Some(freq) => {
                freq.state = state;
                true
            }
            None => false,
        }
    }

    fn get_frequency_state(&self, frequency_hz: u32) -> FrequencyState {
        self.state()
            .frequencies
            .get(&frequency_hz)
            .map(|f| f.state)
            .unwrap_or_default()
    }

    fn is_frequency_active(&self, frequency_hz: u32) -> bool {
        self.state()
            .frequencies
            .get(&frequency_hz)
            .is_some_and(|f| f.state.rx || f.state.tx)
    }

    fn set_radio_gain(&self, gain: f32) {
        self.record(EngineCall::SetRadioGain(gain));
        self.state().gain = gain.clamp(0.0, 1.0);
    }

    fn set_hardware_type(&self, kind: HardwareType) {
        self.record(EngineCall::SetHardwareType(kind));
        self.state().hardware = kind;
    }

    fn set_audio_settings(&self, settings: &AudioSettings) {
        self.record(EngineCall::SetAudioSettings(settings.clone()));
    }

    fn set_cid(&self, cid: &str) {
        self.record(EngineCall::SetCid(cid.to_string()));
        self.state().cid = cid.to_string();
    }

    fn set_ptt(&self, active: bool) {
        self.record(EngineCall::SetPtt(active));
        let changed = {
            let mut state = self.state();
            if state.voice_connected && state.ptt != active {
                state.ptt = active;
                true
            } else {
                false
            }
        };
        if changed {
            self.emit(&EngineEvent::PttState { active });
        }
    }

    fn get_station(&self, callsign: &str) {
        self.record(EngineCall::GetStation(callsign.to_string()));
        let events = self.station_events(callsign);
        self.emit_all(events);
    }

    fn refresh_station(&self, callsign: &str) {
        self.record(EngineCall::RefreshStation(callsign.to_string()));
        let events = self.station_events(callsign);
        self.emit_all(events);
    }

    fn start_mic_test(&self) {
        self.record(EngineCall::StartMicTest);
        self.state().mic_test = true;
        self.emit(&EngineEvent::MicTestLevel {
            vu: 40.0,
            peak: 60.0,
        });
    }

    fn stop_mic_test(&self) {
        self.record(EngineCall::StopMicTest);
        self.state().mic_test = false;
    }

    fn version(&self) -> String {
        self.config().version.clone()
    }

    fn exit(&self) {
        self.record(EngineCall::Exit);
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
