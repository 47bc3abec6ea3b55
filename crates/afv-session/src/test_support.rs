//! In-crate engine double for unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use afv_protocol::HardwareType;

use crate::voice::{AudioSettings, EngineCallback, FrequencyState, VoiceEngine};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Connect(String),
    Disconnect,
    AddFrequency(u32, String),
    RemoveFrequency(u32),
    SetFrequencyState(u32, FrequencyState),
    SetRadioGain(f32),
    SetHardwareType(HardwareType),
    SetAudioSettings,
    SetCid(String),
    SetPtt(bool),
    GetStation(String),
    RefreshStation(String),
    StartMicTest,
    StopMicTest,
    Exit,
}

#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    callback: Mutex<Option<EngineCallback>>,
    reject_connect: AtomicBool,
    reject_frequencies: AtomicBool,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn reject_connect(&self, reject: bool) {
        self.reject_connect.store(reject, Ordering::SeqCst);
    }

    pub fn reject_frequencies(&self, reject: bool) {
        self.reject_frequencies.store(reject, Ordering::SeqCst);
    }

    pub fn fire(&self, kind: &str, arg1: &str, arg2: &str) {
        if let Some(cb) = self.callback.lock().unwrap().as_ref() {
            cb(kind, arg1, arg2);
        }
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl VoiceEngine for FakeEngine {
    fn register_callback(&self, callback: EngineCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    fn connect(&self, password: &str) -> bool {
        self.record(EngineCall::Connect(password.to_string()));
        !self.reject_connect.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.record(EngineCall::Disconnect);
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn add_frequency(&self, frequency_hz: u32, callsign: &str) -> bool {
        self.record(EngineCall::AddFrequency(frequency_hz, callsign.to_string()));
        !self.reject_frequencies.load(Ordering::SeqCst)
    }

    fn remove_frequency(&self, frequency_hz: u32) {
        self.record(EngineCall::RemoveFrequency(frequency_hz));
    }

    fn set_frequency_state(&self, frequency_hz: u32, state: FrequencyState) -> bool {
        self.record(EngineCall::SetFrequencyState(frequency_hz, state));
        !self.reject_frequencies.load(Ordering::SeqCst)
    }

    fn get_frequency_state(&self, _frequency_hz: u32) -> FrequencyState {
        FrequencyState::default()
    }

    fn is_frequency_active(&self, _frequency_hz: u32) -> bool {
        false
    }

    fn set_radio_gain(&self, gain: f32) {
        self.record(EngineCall::SetRadioGain(gain));
    }

    fn set_hardware_type(&self, kind: HardwareType) {
        self.record(EngineCall::SetHardwareType(kind));
    }

    fn set_audio_settings(&self, _settings: &AudioSettings) {
        self.record(EngineCall::SetAudioSettings);
    }

    fn set_cid(&self, cid: &str) {
        self.record(EngineCall::SetCid(cid.to_string()));
    }

    fn set_ptt(&self, active: bool) {
        self.record(EngineCall::SetPtt(active));
    }

    fn get_station(&self, callsign: &str) {
        self.record(EngineCall::GetStation(callsign.to_string()));
    }

    fn refresh_station(&self, callsign: &str) {
        self.record(EngineCall::RefreshStation(callsign.to_string()));
    }

    fn start_mic_test(&self) {
        self.record(EngineCall::StartMicTest);
    }

    fn stop_mic_test(&self) {
        self.record(EngineCall::StopMicTest);
    }

    fn version(&self) -> String {
        "fake-1.0".to_string()
    }

    fn exit(&self) {
        self.record(EngineCall::Exit);
    }
}
