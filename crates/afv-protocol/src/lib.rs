//! Voice Engine Protocol Library
//!
//! This crate holds the vocabulary shared between the voice engine boundary
//! and the session layer:
//!
//! - **Events**: the closed set of event kinds the engine reports through its
//!   single `(kind, arg1, arg2)` callback, decoded into [`EngineEvent`]
//! - **Frequencies**: Hz parsing/formatting and the 199.998 MHz "unset" sentinel
//! - **Keys**: push-to-talk key codes and their human-readable names
//! - **Hardware**: radio hardware emulation profiles
//!
//! Nothing in this crate performs I/O.
//!
//! # Example
//!
//! ```rust
//! use afv_protocol::{EngineEvent, EventKind};
//!
//! let event = EngineEvent::decode("FrequencyRxBegin", "121500000", "").unwrap();
//! assert_eq!(event.kind(), EventKind::FrequencyRxBegin);
//! assert_eq!(event.frequency_hz(), Some(121_500_000));
//!
//! // Malformed input is an error, never a panic
//! assert!(EngineEvent::decode("FrequencyRxBegin", "oops", "").is_err());
//! ```

pub mod error;
pub mod event;
pub mod frequency;
pub mod hardware;
pub mod keys;

pub use error::ParseError;
pub use event::{EngineEvent, EventKind};
pub use frequency::{format_frequency, is_unset, parse_frequency, parse_hz, UNSET_FREQUENCY_HZ};
pub use hardware::HardwareType;
pub use keys::{vc, KeyCode, RAW_KEY_BASE};
