//! Voice Engine Simulation Library
//!
//! This crate provides a stand-in for the native voice engine so the session
//! layer can be driven without audio hardware or a voice network:
//!
//! - **SimulatedEngine**: implements [`afv_session::VoiceEngine`], tracks
//!   frequencies and PTT, and reports events through the registered callback
//!   in the engine's `(kind, arg1, arg2)` string format
//! - **SimStation**: stations that lookups resolve to frequencies
//!
//! # Example
//!
//! ```rust
//! use afv_sim::SimulatedEngine;
//! use afv_session::VoiceEngine;
//!
//! let engine = SimulatedEngine::new();
//! engine.register_callback(Box::new(|kind, arg1, arg2| {
//!     println!("{} {} {}", kind, arg1, arg2);
//! }));
//!
//! // Voice needs a network login first
//! engine.network_login("EGLL_TWR", true, 118_500_000);
//! assert!(engine.connect("secret"));
//! assert!(engine.add_frequency(121_500_000, "GUARD"));
//! ```

pub mod engine;

pub use engine::{EngineCall, SimStation, SimulatedEngine, SimulatedEngineConfig};
