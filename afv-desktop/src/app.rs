//! Console application state

use std::sync::Arc;

use afv_protocol::format_frequency;
use afv_session::{
    CommandDispatcher, CommandError, KeyBound, KeyCaptureBridge, PttSlot, SessionEvent, SessionHandle,
    SessionSnapshot, SlotState,
};
use tracing::{debug, warn};

use crate::console::{ConsoleCommand, HELP};
use crate::settings::SettingsStore;

/// PTT bridge wired to the dispatcher and persisted settings
pub type PttBridge = KeyCaptureBridge<Arc<CommandDispatcher>, Arc<SettingsStore>>;

/// Whether the console loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs console commands against the session
pub struct App {
    handle: SessionHandle,
    dispatcher: Arc<CommandDispatcher>,
    bridge: Arc<PttBridge>,
    settings: Arc<SettingsStore>,
}

impl App {
    pub fn new(
        handle: SessionHandle,
        dispatcher: Arc<CommandDispatcher>,
        bridge: Arc<PttBridge>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            handle,
            dispatcher,
            bridge,
            settings,
        }
    }

    /// Push stored credentials, audio devices and hardware into the dispatcher
    pub fn apply_settings(&self) {
        let settings = self.settings.get();
        self.dispatcher.set_cid(&settings.cid);
        self.dispatcher.set_password(&settings.password);
        self.dispatcher.set_audio_settings(settings.audio_settings());
        self.dispatcher.set_hardware_type(settings.hardware());
    }

    /// Apply the stored gain through the session so observers see it
    pub async fn restore_gain(&self) -> anyhow::Result<()> {
        let gain = self.settings.get().radio_gain;
        self.handle.set_gain(gain).await?;
        Ok(())
    }

    /// Execute one command
    ///
    /// Rejections reach the user through the event stream; only a dead
    /// session actor is returned as an error.
    pub async fn execute(&self, command: ConsoleCommand) -> anyhow::Result<Flow> {
        let result = match command {
            ConsoleCommand::Connect => self.handle.connect().await,
            ConsoleCommand::Disconnect => self.handle.disconnect().await,
            ConsoleCommand::Add {
                frequency_hz,
                callsign,
            } => self
                .handle
                .add_frequency(frequency_hz, callsign)
                .await
                .map(|_| ()),
            ConsoleCommand::Remove { frequency_hz } => {
                self.handle.remove_frequency(frequency_hz).await
            }
            ConsoleCommand::State {
                frequency_hz,
                state,
            } => self
                .handle
                .set_frequency_state(frequency_hz, state)
                .await
                .map(|_| ()),
            ConsoleCommand::Gain(percent) => {
                self.persist(|s| s.radio_gain = percent);
                self.handle.set_gain(percent).await
            }
            ConsoleCommand::Hardware(kind) => {
                self.persist(|s| s.hardware_type = kind.index());
                self.handle.set_hardware_type(kind).await
            }
            ConsoleCommand::Cid(cid) => {
                self.dispatcher.set_cid(&cid);
                self.persist(|s| s.cid = cid);
                Ok(())
            }
            ConsoleCommand::Password(password) => {
                self.dispatcher.set_password(&password);
                self.persist(|s| s.password = password);
                Ok(())
            }
            ConsoleCommand::Bind(slot) => {
                self.bridge.begin_capture(slot);
                println!("{}: press a key to bind", slot);
                Ok(())
            }
            ConsoleCommand::CancelBind(slot) => {
                if !self.bridge.cancel_capture(slot) {
                    println!("{} is not waiting for a key", slot);
                }
                Ok(())
            }
            ConsoleCommand::Station(callsign) => self.handle.request_station(callsign).await,
            ConsoleCommand::RefreshStation(callsign) => {
                self.handle.refresh_station(callsign).await
            }
            ConsoleCommand::MicTest(true) => self.handle.start_mic_test().await,
            ConsoleCommand::MicTest(false) => self.handle.stop_mic_test().await,
            ConsoleCommand::Status => {
                let snapshot = self.handle.snapshot().await?;
                println!("{}", self.format_status(&snapshot));
                Ok(())
            }
            ConsoleCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        };

        settle(result)
    }

    fn persist(&self, change: impl FnOnce(&mut crate::settings::Settings)) {
        if let Err(e) = self.settings.update(change) {
            warn!("Could not save settings: {}", e);
        }
    }

    /// Render a snapshot plus PTT bindings
    pub fn format_status(&self, snapshot: &SessionSnapshot) -> String {
        let mut out = format_status(snapshot);
        for slot in PttSlot::ALL {
            let binding = match self.bridge.slot_state(slot) {
                SlotState::Capturing { .. } => "waiting for key".to_string(),
                SlotState::Idle { key } => key.name(),
            };
            out.push_str(&format!("\n{}: {}", slot, binding));
        }
        if self.bridge.ptt_active() {
            out.push_str("\nPTT: ON");
        }
        out
    }
}

/// Outcome of a session command for the console loop
///
/// Rejections are already on the event stream as `Error` events.
fn settle(result: Result<(), CommandError>) -> anyhow::Result<Flow> {
    match result {
        Ok(()) => Ok(Flow::Continue),
        Err(CommandError::ActorUnavailable) => Err(CommandError::ActorUnavailable.into()),
        Err(e) => {
            debug!("Command rejected: {}", e);
            Ok(Flow::Continue)
        }
    }
}

/// Render session state and the radio list
pub fn format_status(snapshot: &SessionSnapshot) -> String {
    let session = &snapshot.session;
    let mut out = String::new();

    if session.network_connected {
        out.push_str(&format!(
            "Network: {} ({}) on {}\n",
            session.callsign,
            if session.is_atc { "ATC" } else { "pilot" },
            format_frequency(session.primary_frequency_hz)
        ));
    } else {
        out.push_str("Network: not connected\n");
    }
    out.push_str(&format!(
        "Voice: {}  Gain: {}%\n",
        session.voice.name(),
        session.radio_gain_percent
    ));

    if snapshot.radios.is_empty() {
        out.push_str("No radios");
    } else {
        let lines: Vec<String> = snapshot
            .radios
            .iter()
            .map(|r| {
                format!(
                    "{:>12} {:<12} {}{}{}{}{} {}{}",
                    r.frequency_display(),
                    r.station_callsign,
                    if r.rx { "RX " } else { "-- " },
                    if r.tx { "TX " } else { "-- " },
                    if r.xc { "XC " } else { "-- " },
                    if r.cross_couple_across { "XCA " } else { "" },
                    if r.on_speaker { "SPK" } else { "HDS" },
                    if r.currently_receiving {
                        format!("<< {}", r.last_heard_callsign)
                    } else {
                        String::new()
                    },
                    if r.currently_transmitting { ">> TX" } else { "" },
                )
            })
            .collect();
        out.push_str(&lines.join("\n"));
    }
    out
}

/// One-line rendering of an observer event, `None` for noisy ones
pub fn describe_event(event: &SessionEvent) -> Option<String> {
    let text = match event {
        SessionEvent::VoiceStateChanged { state } => format!("Voice {}", state.name()),
        SessionEvent::NetworkStateChanged {
            connected: true,
            callsign,
            is_atc,
            frequency_hz,
        } => format!(
            "Network connected as {}{} on {}",
            callsign,
            if *is_atc { " (ATC)" } else { "" },
            format_frequency(*frequency_hz)
        ),
        SessionEvent::NetworkStateChanged {
            connected: false, ..
        } => "Network disconnected".to_string(),
        SessionEvent::GainChanged { percent } => format!("Gain {}%", percent),
        SessionEvent::MicLevel { .. } => return None,
        SessionEvent::RadioAdded { radio } => format!(
            "+ {} {}",
            radio.frequency_display(),
            radio.station_callsign
        ),
        SessionEvent::RadioUpdated { radio } if radio.currently_receiving => format!(
            "{} receiving {}",
            radio.frequency_display(),
            radio.last_heard_callsign
        ),
        SessionEvent::RadioUpdated { .. } => return None,
        SessionEvent::RadioRemoved { frequency_hz } => {
            format!("- {}", format_frequency(*frequency_hz))
        }
        SessionEvent::RadiosCleared => "All radios removed".to_string(),
        SessionEvent::TransmitStateChanged { active } => {
            format!("Transmit {}", if *active { "ON" } else { "off" })
        }
        SessionEvent::Error { source, message } => format!("! {}: {}", source, message),
    };
    Some(text)
}

pub fn describe_binding(bound: &KeyBound) -> String {
    format!("{} bound to {}", bound.slot, bound.name)
}
