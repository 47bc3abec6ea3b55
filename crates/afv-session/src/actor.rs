//! Session Actor
//!
//! All mutations of session and radio state happen inside this actor. It
//! owns the [`SessionEngine`] and serializes two inputs:
//!
//! - user commands arriving through a [`SessionHandle`]
//! - decoded engine events queued by the [`EventDemultiplexer`]
//!
//! After every step the engine's buffered [`SessionEvent`]s are forwarded to
//! the observer channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use afv_session::{spawn_session, CommandDispatcher};
//!
//! let dispatcher = Arc::new(CommandDispatcher::new(engine));
//! let mut session = spawn_session(dispatcher);
//!
//! session.handle.connect().await?;
//! while let Some(event) = session.events.recv().await {
//!     // update the UI
//! }
//! ```

use std::sync::Arc;

use afv_protocol::{EngineEvent, HardwareType};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::demux::EventDemultiplexer;
use crate::dispatcher::CommandDispatcher;
use crate::engine::SessionEngine;
use crate::error::CommandError;
use crate::events::SessionEvent;
use crate::state::{Radio, SessionSnapshot};
use crate::voice::FrequencyState;

/// Capacity of the user command channel
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the observer event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Commands sent to the session actor
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a voice connection
    Connect {
        response: oneshot::Sender<Result<(), CommandError>>,
    },

    /// Drop the voice connection
    Disconnect {
        response: oneshot::Sender<Result<(), CommandError>>,
    },

    /// Add a frequency to the engine and the registry
    AddFrequency {
        frequency_hz: u32,
        /// Station callsign the frequency belongs to
        callsign: String,
        response: oneshot::Sender<Result<Radio, CommandError>>,
    },

    /// Remove a frequency
    RemoveFrequency {
        frequency_hz: u32,
        response: oneshot::Sender<Result<(), CommandError>>,
    },

    /// Change rx/tx/xc/speaker flags for a frequency
    SetFrequencyState {
        frequency_hz: u32,
        state: FrequencyState,
        response: oneshot::Sender<Result<Radio, CommandError>>,
    },

    /// Set radio gain (percent, clamped to 100)
    SetGain { percent: u8 },

    /// Select the radio hardware profile
    SetHardwareType { kind: HardwareType },

    StartMicTest,

    StopMicTest,

    /// Look up a station; its frequencies arrive as engine events
    RequestStation {
        callsign: String,
        response: oneshot::Sender<Result<(), CommandError>>,
    },

    /// Refresh a station's cached metadata
    RefreshStation {
        callsign: String,
        response: oneshot::Sender<Result<(), CommandError>>,
    },

    /// Copy of the current state
    Snapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Run the session actor until shutdown or until every handle is dropped
pub async fn run_session_actor(
    mut engine: SessionEngine,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    mut engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    info!("Session actor started");
    let mut engine_open = true;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                if !handle_command(&mut engine, cmd) {
                    break;
                }
            }

            event = engine_rx.recv(), if engine_open => {
                match event {
                    Some(event) => engine.apply_engine_event(event),
                    None => {
                        debug!("Engine event stream closed");
                        engine_open = false;
                    }
                }
            }
        }

        flush_events(&mut engine, &event_tx).await;
    }

    flush_events(&mut engine, &event_tx).await;
    info!("Session actor stopped");
}

/// Apply one command. Returns false on shutdown.
fn handle_command(engine: &mut SessionEngine, cmd: SessionCommand) -> bool {
    match cmd {
        SessionCommand::Connect { response } => {
            let _ = response.send(engine.connect());
        }

        SessionCommand::Disconnect { response } => {
            let _ = response.send(engine.disconnect());
        }

        SessionCommand::AddFrequency {
            frequency_hz,
            callsign,
            response,
        } => {
            let _ = response.send(engine.add_frequency(frequency_hz, &callsign));
        }

        SessionCommand::RemoveFrequency {
            frequency_hz,
            response,
        } => {
            let _ = response.send(engine.remove_frequency(frequency_hz));
        }

        SessionCommand::SetFrequencyState {
            frequency_hz,
            state,
            response,
        } => {
            let _ = response.send(engine.set_frequency_state(frequency_hz, state));
        }

        SessionCommand::SetGain { percent } => {
            engine.set_gain(percent);
        }

        SessionCommand::SetHardwareType { kind } => {
            engine.set_hardware_type(kind);
        }

        SessionCommand::StartMicTest => engine.start_mic_test(),

        SessionCommand::StopMicTest => engine.stop_mic_test(),

        SessionCommand::RequestStation { callsign, response } => {
            let _ = response.send(engine.request_station(&callsign));
        }

        SessionCommand::RefreshStation { callsign, response } => {
            let _ = response.send(engine.refresh_station(&callsign));
        }

        SessionCommand::Snapshot { response } => {
            let _ = response.send(engine.snapshot());
        }

        SessionCommand::Shutdown => {
            info!("Session actor shutting down");
            return false;
        }
    }
    true
}

async fn flush_events(engine: &mut SessionEngine, event_tx: &mpsc::Sender<SessionEvent>) {
    for event in engine.drain_events() {
        // Observers going away is not an error for the actor
        let _ = event_tx.send(event).await;
    }
}

/// Cloneable handle for sending commands to the session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    pub async fn connect(&self) -> Result<(), CommandError> {
        self.request(|response| SessionCommand::Connect { response })
            .await?
    }

    pub async fn disconnect(&self) -> Result<(), CommandError> {
        self.request(|response| SessionCommand::Disconnect { response })
            .await?
    }

    pub async fn add_frequency(
        &self,
        frequency_hz: u32,
        callsign: impl Into<String>,
    ) -> Result<Radio, CommandError> {
        let callsign = callsign.into();
        self.request(|response| SessionCommand::AddFrequency {
            frequency_hz,
            callsign,
            response,
        })
        .await?
    }

    pub async fn remove_frequency(&self, frequency_hz: u32) -> Result<(), CommandError> {
        self.request(|response| SessionCommand::RemoveFrequency {
            frequency_hz,
            response,
        })
        .await?
    }

    pub async fn set_frequency_state(
        &self,
        frequency_hz: u32,
        state: FrequencyState,
    ) -> Result<Radio, CommandError> {
        self.request(|response| SessionCommand::SetFrequencyState {
            frequency_hz,
            state,
            response,
        })
        .await?
    }

    pub async fn set_gain(&self, percent: u8) -> Result<(), CommandError> {
        self.send(SessionCommand::SetGain { percent }).await
    }

    pub async fn set_hardware_type(&self, kind: HardwareType) -> Result<(), CommandError> {
        self.send(SessionCommand::SetHardwareType { kind }).await
    }

    pub async fn start_mic_test(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::StartMicTest).await
    }

    pub async fn stop_mic_test(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::StopMicTest).await
    }

    pub async fn request_station(&self, callsign: impl Into<String>) -> Result<(), CommandError> {
        let callsign = callsign.into();
        self.request(|response| SessionCommand::RequestStation { callsign, response })
            .await?
    }

    pub async fn refresh_station(&self, callsign: impl Into<String>) -> Result<(), CommandError> {
        let callsign = callsign.into();
        self.request(|response| SessionCommand::RefreshStation { callsign, response })
            .await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, CommandError> {
        self.request(|response| SessionCommand::Snapshot { response })
            .await
    }

    /// Ask the actor to stop. A stopped actor is not an error here.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SessionCommand::Shutdown).await;
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), CommandError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| CommandError::ActorUnavailable)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, CommandError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(make(response_tx)).await?;
        response_rx
            .await
            .map_err(|_| CommandError::ActorUnavailable)
    }
}

/// A running session actor and the channels wired to it
pub struct SpawnedSession {
    /// Command handle
    pub handle: SessionHandle,
    /// Observer notifications
    pub events: mpsc::Receiver<SessionEvent>,
    /// Installed engine callback target
    pub demux: Arc<EventDemultiplexer>,
    /// Actor task
    pub task: JoinHandle<()>,
}

/// Wire the engine callback to a new session actor and spawn it
///
/// Must be called from within a tokio runtime.
pub fn spawn_session(dispatcher: Arc<CommandDispatcher>) -> SpawnedSession {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();

    let demux = Arc::new(EventDemultiplexer::new(engine_tx));
    dispatcher.register_callback(demux.clone().into_callback());

    let engine = SessionEngine::new(dispatcher);
    let task = tokio::spawn(run_session_actor(engine, cmd_rx, engine_rx, event_tx));

    SpawnedSession {
        handle: SessionHandle::new(cmd_tx),
        events,
        demux,
        task,
    }
}
