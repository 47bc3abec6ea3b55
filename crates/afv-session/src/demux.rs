//! Event demultiplexer
//!
//! The engine calls back on its own thread with raw `(kind, arg1, arg2)`
//! triples. [`EventDemultiplexer::dispatch`] decodes each triple once and
//! queues it for the session actor without blocking the engine thread.
//! Unknown or malformed events are logged and dropped here and never reach
//! the state owners.
//!
//! [`route`] splits a decoded event into the notification for exactly one
//! downstream handler: the session state machine or the radio registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use afv_protocol::EngineEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::voice::EngineCallback;

/// Notifications handled by the session state machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    VoiceConnected,
    VoiceDisconnected,
    NetworkConnected {
        callsign: String,
        is_atc: bool,
        frequency_hz: u32,
    },
    NetworkDisconnected,
    MicTestLevel {
        vu: f32,
        peak: f32,
    },
    EngineError {
        message: String,
    },
}

/// Notifications handled by the radio registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioNotification {
    RxBegin { frequency_hz: u32 },
    RxEnd { frequency_hz: u32 },
    StationRxBegin { frequency_hz: u32, callsign: String },
    TransceiversUpdated { station: String, count: u32 },
    StationData { station: String, frequency_hz: u32 },
    PttState { active: bool },
}

/// A decoded event assigned to its handler
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Session(SessionNotification),
    Registry(RadioNotification),
}

/// Assign a decoded event to exactly one handler
pub fn route(event: EngineEvent) -> Routed {
    match event {
        EngineEvent::VoiceConnected => Routed::Session(SessionNotification::VoiceConnected),
        EngineEvent::VoiceDisconnected => {
            Routed::Session(SessionNotification::VoiceDisconnected)
        }
        EngineEvent::NetworkConnected {
            callsign,
            is_atc,
            frequency_hz,
        } => Routed::Session(SessionNotification::NetworkConnected {
            callsign,
            is_atc,
            frequency_hz,
        }),
        EngineEvent::NetworkDisconnected => {
            Routed::Session(SessionNotification::NetworkDisconnected)
        }
        EngineEvent::MicTestLevel { vu, peak } => {
            Routed::Session(SessionNotification::MicTestLevel { vu, peak })
        }
        EngineEvent::Error { message } => {
            Routed::Session(SessionNotification::EngineError { message })
        }
        EngineEvent::FrequencyRxBegin { frequency_hz } => {
            Routed::Registry(RadioNotification::RxBegin { frequency_hz })
        }
        EngineEvent::FrequencyRxEnd { frequency_hz } => {
            Routed::Registry(RadioNotification::RxEnd { frequency_hz })
        }
        EngineEvent::StationRxBegin {
            frequency_hz,
            callsign,
        } => Routed::Registry(RadioNotification::StationRxBegin {
            frequency_hz,
            callsign,
        }),
        EngineEvent::StationTransceiversUpdated { station, count } => {
            Routed::Registry(RadioNotification::TransceiversUpdated { station, count })
        }
        EngineEvent::StationDataReceived {
            station,
            frequency_hz,
        } => Routed::Registry(RadioNotification::StationData {
            station,
            frequency_hz,
        }),
        EngineEvent::PttState { active } => {
            Routed::Registry(RadioNotification::PttState { active })
        }
    }
}

/// Receives the engine callback stream and queues decoded events
pub struct EventDemultiplexer {
    tx: mpsc::UnboundedSender<EngineEvent>,
    dropped: AtomicU64,
}

impl EventDemultiplexer {
    /// Create a demultiplexer feeding the given queue
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Handle one raw engine callback
    ///
    /// Returns true if the event was queued. Never panics and never blocks.
    pub fn dispatch(&self, kind: &str, arg1: &str, arg2: &str) -> bool {
        let event = match EngineEvent::decode(kind, arg1, arg2) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    "Dropping engine event {:?} ({:?}, {:?}): {}",
                    kind, arg1, arg2, e
                );
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        debug!("Engine event: {:?}", event);

        if self.tx.send(event).is_err() {
            debug!("Session actor gone, dropping engine event {:?}", kind);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Number of events dropped so far
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Wrap into a callback suitable for [`crate::VoiceEngine::register_callback`]
    pub fn into_callback(self: Arc<Self>) -> EngineCallback {
        Box::new(move |kind, arg1, arg2| {
            self.dispatch(kind, arg1, arg2);
        })
    }
}
