//! Voice Session Layer
//!
//! This crate keeps a consistent view of the voice connection and of every
//! monitored frequency while three independent sources act on it:
//!
//! - **User commands** through a [`SessionHandle`]
//! - **Engine callbacks** arriving on an engine-owned thread, decoded by the
//!   [`EventDemultiplexer`]
//! - **Global key events** turned into push-to-talk by the
//!   [`KeyCaptureBridge`]
//!
//! # Architecture
//!
//! Session and radio state have exactly one owner, the [`SessionEngine`],
//! which lives inside the session actor. Commands and decoded engine events
//! are serialized through the actor, so two updates for the same frequency
//! can never interleave. Observers receive [`SessionEvent`]s on one channel
//! or poll a [`SessionSnapshot`].
//!
//! PTT is latency sensitive and does not go through the actor: the key
//! bridge calls the [`CommandDispatcher`] directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use afv_session::{FrequencyState, SessionEngine};
//! # fn demo(mut engine: SessionEngine) -> Result<(), afv_session::CommandError> {
//! // Voice must already be connected
//! engine.add_frequency(121_500_000, "EGLL_TWR")?;
//! engine.set_frequency_state(121_500_000, FrequencyState::rx_only())?;
//!
//! for event in engine.drain_events() {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod demux;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod ptt;
pub mod registry;
pub mod session;
pub mod state;
pub mod voice;

#[cfg(test)]
mod test_support;

// Re-export actor types
pub use actor::{run_session_actor, spawn_session, SessionCommand, SessionHandle, SpawnedSession};

// Re-export demultiplexer types
pub use demux::{route, EventDemultiplexer, RadioNotification, Routed, SessionNotification};

pub use dispatcher::{CommandDispatcher, Credentials};
pub use engine::SessionEngine;
pub use error::CommandError;
pub use events::SessionEvent;
pub use ptt::{
    BindingStore, KeyAction, KeyBound, KeyCaptureBridge, MemoryBindingStore, PttSink, PttSlot,
    SlotState,
};
pub use registry::RadioRegistry;
pub use session::SessionStateMachine;
pub use state::{Radio, Session, SessionSnapshot, VoiceState, DEFAULT_GAIN_PERCENT};
pub use voice::{AudioSettings, EngineCallback, FrequencyState, VoiceEngine};
