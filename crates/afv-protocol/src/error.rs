//! Error types for voice engine event decoding

use thiserror::Error;

/// Errors that can occur while decoding an engine event or a wire value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Event kind is not part of the known set
    #[error("unknown event kind: {0:?}")]
    UnknownEvent(String),

    /// A required argument was empty
    #[error("missing field `{field}` in {kind} event")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// A numeric argument did not parse
    #[error("invalid number for `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A boolean flag was neither "0" nor "1"
    #[error("invalid flag for `{field}`: {value:?}")]
    InvalidFlag { field: &'static str, value: String },

    /// The comma-joined network payload did not have two fields
    #[error("malformed network payload: {0:?}")]
    InvalidNetworkPayload(String),

    /// Frequency text could not be interpreted as MHz or Hz
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),
}
