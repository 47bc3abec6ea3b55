//! Command dispatcher
//!
//! A thin synchronous façade over the [`VoiceEngine`] command surface. It
//! checks preconditions (credentials before connect), converts the engine's
//! boolean accept signals into [`CommandError`]s, and keeps the settings that
//! have to be re-applied before certain calls (audio devices, hardware type).
//!
//! The dispatcher never changes session state itself and performs no
//! cross-command ordering; each call is atomic only at the engine boundary.
//! It is shared between the session actor and the key capture thread.

use std::sync::{Arc, PoisonError, RwLock};

use afv_protocol::HardwareType;
use tracing::{debug, info, warn};

use crate::error::CommandError;
use crate::voice::{AudioSettings, EngineCallback, FrequencyState, VoiceEngine};

/// Network login credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Network user id
    pub cid: String,
    /// Network password
    pub password: String,
}

impl Credentials {
    /// Both fields are non-empty
    pub fn is_complete(&self) -> bool {
        !self.cid.trim().is_empty() && !self.password.is_empty()
    }
}

/// Synchronous request/response façade over the voice engine
pub struct CommandDispatcher {
    engine: Arc<dyn VoiceEngine>,
    credentials: RwLock<Credentials>,
    audio: RwLock<AudioSettings>,
    hardware: RwLock<HardwareType>,
}

impl CommandDispatcher {
    /// Create a dispatcher with no credentials and default audio settings
    pub fn new(engine: Arc<dyn VoiceEngine>) -> Self {
        Self {
            engine,
            credentials: RwLock::new(Credentials::default()),
            audio: RwLock::new(AudioSettings::default()),
            hardware: RwLock::new(HardwareType::default()),
        }
    }

    /// Install the engine's event callback
    pub fn register_callback(&self, callback: EngineCallback) {
        self.engine.register_callback(callback);
    }

    /// Set the network user id (also forwarded to the engine)
    pub fn set_cid(&self, cid: &str) {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .cid = cid.to_string();
        self.engine.set_cid(cid);
    }

    /// Set the network password (kept locally until connect)
    pub fn set_password(&self, password: &str) {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .password = password.to_string();
    }

    /// Whether connect would pass its credential check
    pub fn has_credentials(&self) -> bool {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_complete()
    }

    /// Store audio device settings, applied before connect and mic test
    pub fn set_audio_settings(&self, settings: AudioSettings) {
        *self.audio.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Current audio device settings
    pub fn audio_settings(&self) -> AudioSettings {
        self.audio
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current hardware profile
    pub fn hardware_type(&self) -> HardwareType {
        *self.hardware.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_audio_settings(&self) {
        let audio = self.audio_settings();
        self.engine.set_audio_settings(&audio);
        self.engine.set_hardware_type(self.hardware_type());
    }

    /// Start a voice connection
    ///
    /// Fails fast without touching the engine when credentials are missing.
    /// Acceptance only means the attempt started; the connected state arrives
    /// later as an engine event.
    pub fn connect(&self) -> Result<(), CommandError> {
        let credentials = self
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if !credentials.is_complete() {
            warn!("Connect refused: credentials not configured");
            return Err(CommandError::MissingCredentials);
        }

        self.apply_audio_settings();

        if self.engine.connect(&credentials.password) {
            info!("Voice connect accepted for CID {}", credentials.cid);
            Ok(())
        } else {
            warn!("Voice engine rejected connect");
            Err(CommandError::Rejected { command: "connect" })
        }
    }

    pub fn disconnect(&self) {
        info!("Voice disconnect requested");
        self.engine.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    /// Add a frequency to the engine
    pub fn add_frequency(&self, frequency_hz: u32, callsign: &str) -> Result<(), CommandError> {
        if self.engine.add_frequency(frequency_hz, callsign) {
            debug!("Engine accepted frequency {} ({})", frequency_hz, callsign);
            Ok(())
        } else {
            warn!("Engine rejected frequency {} ({})", frequency_hz, callsign);
            Err(CommandError::Rejected {
                command: "add frequency",
            })
        }
    }

    pub fn remove_frequency(&self, frequency_hz: u32) {
        debug!("Removing frequency {}", frequency_hz);
        self.engine.remove_frequency(frequency_hz);
    }

    /// Change rx/tx/xc/speaker state for a frequency
    pub fn set_frequency_state(
        &self,
        frequency_hz: u32,
        state: FrequencyState,
    ) -> Result<(), CommandError> {
        if self.engine.set_frequency_state(frequency_hz, state) {
            debug!("Engine accepted state {:?} for {}", state, frequency_hz);
            Ok(())
        } else {
            warn!("Engine rejected state {:?} for {}", state, frequency_hz);
            Err(CommandError::Rejected {
                command: "set frequency state",
            })
        }
    }

    pub fn get_frequency_state(&self, frequency_hz: u32) -> FrequencyState {
        self.engine.get_frequency_state(frequency_hz)
    }

    pub fn is_frequency_active(&self, frequency_hz: u32) -> bool {
        self.engine.is_frequency_active(frequency_hz)
    }

    /// Set radio gain in percent; values above 100 are clamped
    ///
    /// Returns the percentage actually applied.
    pub fn set_gain(&self, percent: u8) -> u8 {
        let percent = percent.min(100);
        self.engine.set_radio_gain(f32::from(percent) / 100.0);
        percent
    }

    pub fn set_hardware_type(&self, kind: HardwareType) {
        *self.hardware.write().unwrap_or_else(PoisonError::into_inner) = kind;
        self.engine.set_hardware_type(kind);
    }

    pub fn start_mic_test(&self) {
        self.apply_audio_settings();
        self.engine.start_mic_test();
    }

    pub fn stop_mic_test(&self) {
        self.engine.stop_mic_test();
    }

    pub fn set_ptt(&self, active: bool) {
        self.engine.set_ptt(active);
    }

    pub fn get_station(&self, callsign: &str) {
        debug!("Requesting station data for {}", callsign);
        self.engine.get_station(callsign);
    }

    pub fn refresh_station(&self, callsign: &str) {
        debug!("Refreshing station data for {}", callsign);
        self.engine.refresh_station(callsign);
    }

    pub fn version(&self) -> String {
        self.engine.version()
    }

    pub fn exit(&self) {
        info!("Releasing voice engine");
        self.engine.exit();
    }
}
