//! Error types for the session layer

use thiserror::Error;

/// Reasons a command was rejected
///
/// None of these are fatal. Each is surfaced to the user and leaves session
/// and radio state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// CID or password not configured
    #[error("missing credentials: set a CID and password before connecting")]
    MissingCredentials,

    /// The voice engine declined the call
    #[error("voice engine rejected {command}")]
    Rejected { command: &'static str },

    /// Frequency is already in the radio registry
    #[error("frequency already added: {0} Hz")]
    DuplicateFrequency(u32),

    /// Frequency is not in the radio registry
    #[error("frequency not found: {0} Hz")]
    FrequencyNotFound(u32),

    /// Voice is not connected
    #[error("voice is not connected")]
    NotConnected,

    /// Voice is already connected or connecting
    #[error("voice is already connected or connecting")]
    AlreadyConnected,

    /// No network login detected, connecting is not possible yet
    #[error("not connected to the network")]
    NetworkUnavailable,

    /// The session actor is gone
    #[error("session actor is not running")]
    ActorUnavailable,
}
