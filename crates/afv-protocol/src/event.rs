//! Voice engine event decoding
//!
//! The engine reports everything through a single callback carrying three
//! strings: `(kind, arg1, arg2)`. This module turns that triple into a typed
//! [`EngineEvent`] exactly once, at the boundary, so downstream code can use
//! plain pattern matching.
//!
//! | Kind                         | arg1              | arg2                      |
//! |------------------------------|-------------------|---------------------------|
//! | `MicTest`                    | vu (float)        | peak vu (float)           |
//! | `FrequencyRxBegin`           | frequency Hz      |                           |
//! | `FrequencyRxEnd`             | frequency Hz      |                           |
//! | `StationRxBegin`             | frequency Hz      | transmitting callsign     |
//! | `StationTransceiversUpdated` | station callsign  | transceiver count         |
//! | `StationDataReceived`        | station callsign  | frequency Hz              |
//! | `PttState`                   | `0` / `1`         |                           |
//! | `error`                      | message           |                           |
//! | `VoiceConnected`             |                   |                           |
//! | `VoiceDisconnected`          |                   |                           |
//! | `network-connected`          | own callsign      | `<0\|1>,<frequency Hz>`   |
//! | `network-disconnected`       |                   |                           |

use crate::error::ParseError;
use crate::frequency::parse_hz;

/// Closed set of event kinds the engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    MicTestLevel,
    FrequencyRxBegin,
    FrequencyRxEnd,
    StationRxBegin,
    StationTransceiversUpdated,
    StationDataReceived,
    PttState,
    Error,
    VoiceConnected,
    VoiceDisconnected,
    NetworkConnected,
    NetworkDisconnected,
    Unknown,
}

impl EventKind {
    /// All known kinds (excludes `Unknown`)
    pub const ALL: [EventKind; 12] = [
        EventKind::MicTestLevel,
        EventKind::FrequencyRxBegin,
        EventKind::FrequencyRxEnd,
        EventKind::StationRxBegin,
        EventKind::StationTransceiversUpdated,
        EventKind::StationDataReceived,
        EventKind::PttState,
        EventKind::Error,
        EventKind::VoiceConnected,
        EventKind::VoiceDisconnected,
        EventKind::NetworkConnected,
        EventKind::NetworkDisconnected,
    ];

    /// Classify a raw kind string
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "MicTest" | "VuMeter" => EventKind::MicTestLevel,
            "FrequencyRxBegin" => EventKind::FrequencyRxBegin,
            "FrequencyRxEnd" => EventKind::FrequencyRxEnd,
            "StationRxBegin" => EventKind::StationRxBegin,
            "StationTransceiversUpdated" => EventKind::StationTransceiversUpdated,
            "StationDataReceived" => EventKind::StationDataReceived,
            "PttState" => EventKind::PttState,
            "error" | "Error" => EventKind::Error,
            "VoiceConnected" => EventKind::VoiceConnected,
            "VoiceDisconnected" => EventKind::VoiceDisconnected,
            "network-connected" | "NetworkConnected" => EventKind::NetworkConnected,
            "network-disconnected" | "NetworkDisconnected" => EventKind::NetworkDisconnected,
            _ => EventKind::Unknown,
        }
    }

    /// Canonical wire name, as emitted by the engine
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::MicTestLevel => "MicTest",
            EventKind::FrequencyRxBegin => "FrequencyRxBegin",
            EventKind::FrequencyRxEnd => "FrequencyRxEnd",
            EventKind::StationRxBegin => "StationRxBegin",
            EventKind::StationTransceiversUpdated => "StationTransceiversUpdated",
            EventKind::StationDataReceived => "StationDataReceived",
            EventKind::PttState => "PttState",
            EventKind::Error => "error",
            EventKind::VoiceConnected => "VoiceConnected",
            EventKind::VoiceDisconnected => "VoiceDisconnected",
            EventKind::NetworkConnected => "network-connected",
            EventKind::NetworkDisconnected => "network-disconnected",
            EventKind::Unknown => "unknown",
        }
    }
}

/// A decoded engine event
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Microphone test levels, scaled to 0..=100
    MicTestLevel { vu: f32, peak: f32 },

    /// Audio started on a frequency
    FrequencyRxBegin { frequency_hz: u32 },

    /// Audio stopped on a frequency
    FrequencyRxEnd { frequency_hz: u32 },

    /// A specific station started transmitting on a frequency
    StationRxBegin { frequency_hz: u32, callsign: String },

    /// The number of transceivers backing a station changed
    StationTransceiversUpdated { station: String, count: u32 },

    /// Station metadata lookup resolved a station to a frequency
    StationDataReceived { station: String, frequency_hz: u32 },

    /// Engine-side transmit state
    PttState { active: bool },

    /// Engine-reported error, forwarded verbatim
    Error { message: String },

    VoiceConnected,

    VoiceDisconnected,

    /// Network login detected for our own position
    NetworkConnected {
        callsign: String,
        is_atc: bool,
        frequency_hz: u32,
    },

    NetworkDisconnected,
}

impl EngineEvent {
    /// Decode a raw `(kind, arg1, arg2)` triple
    ///
    /// Never panics. Unknown kinds and malformed arguments come back as
    /// [`ParseError`]; callers are expected to log and drop them.
    pub fn decode(kind: &str, arg1: &str, arg2: &str) -> Result<Self, ParseError> {
        let event_kind = EventKind::from_wire(kind);
        let name = event_kind.wire_name();

        let event = match event_kind {
            EventKind::MicTestLevel => EngineEvent::MicTestLevel {
                vu: parse_level("vu", arg1)?,
                peak: parse_level("peak", arg2)?,
            },
            EventKind::FrequencyRxBegin => EngineEvent::FrequencyRxBegin {
                frequency_hz: parse_hz("frequency", arg1)?,
            },
            EventKind::FrequencyRxEnd => EngineEvent::FrequencyRxEnd {
                frequency_hz: parse_hz("frequency", arg1)?,
            },
            EventKind::StationRxBegin => EngineEvent::StationRxBegin {
                frequency_hz: parse_hz("frequency", arg1)?,
                callsign: required(name, "callsign", arg2)?,
            },
            EventKind::StationTransceiversUpdated => EngineEvent::StationTransceiversUpdated {
                station: required(name, "station", arg1)?,
                count: parse_count("count", arg2)?,
            },
            EventKind::StationDataReceived => EngineEvent::StationDataReceived {
                station: required(name, "station", arg1)?,
                frequency_hz: parse_hz("frequency", arg2)?,
            },
            EventKind::PttState => EngineEvent::PttState {
                active: parse_flag("state", arg1)?,
            },
            // Forwarded to the user exactly as the engine reported it
            EventKind::Error => EngineEvent::Error {
                message: arg1.to_string(),
            },
            EventKind::VoiceConnected => EngineEvent::VoiceConnected,
            EventKind::VoiceDisconnected => EngineEvent::VoiceDisconnected,
            EventKind::NetworkConnected => {
                let callsign = required(name, "callsign", arg1)?;
                let (flag, freq) = arg2
                    .split_once(',')
                    .ok_or_else(|| ParseError::InvalidNetworkPayload(arg2.to_string()))?;
                EngineEvent::NetworkConnected {
                    callsign,
                    is_atc: parse_flag("atc", flag)?,
                    frequency_hz: parse_hz("frequency", freq)?,
                }
            }
            EventKind::NetworkDisconnected => EngineEvent::NetworkDisconnected,
            EventKind::Unknown => return Err(ParseError::UnknownEvent(kind.to_string())),
        };

        Ok(event)
    }

    /// The kind this event was decoded from
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::MicTestLevel { .. } => EventKind::MicTestLevel,
            EngineEvent::FrequencyRxBegin { .. } => EventKind::FrequencyRxBegin,
            EngineEvent::FrequencyRxEnd { .. } => EventKind::FrequencyRxEnd,
            EngineEvent::StationRxBegin { .. } => EventKind::StationRxBegin,
            EngineEvent::StationTransceiversUpdated { .. } => {
                EventKind::StationTransceiversUpdated
            }
            EngineEvent::StationDataReceived { .. } => EventKind::StationDataReceived,
            EngineEvent::PttState { .. } => EventKind::PttState,
            EngineEvent::Error { .. } => EventKind::Error,
            EngineEvent::VoiceConnected => EventKind::VoiceConnected,
            EngineEvent::VoiceDisconnected => EventKind::VoiceDisconnected,
            EngineEvent::NetworkConnected { .. } => EventKind::NetworkConnected,
            EngineEvent::NetworkDisconnected => EventKind::NetworkDisconnected,
        }
    }

    /// Get the frequency if this event is scoped to a single radio
    pub fn frequency_hz(&self) -> Option<u32> {
        match self {
            EngineEvent::FrequencyRxBegin { frequency_hz }
            | EngineEvent::FrequencyRxEnd { frequency_hz }
            | EngineEvent::StationRxBegin { frequency_hz, .. }
            | EngineEvent::StationDataReceived { frequency_hz, .. } => Some(*frequency_hz),
            _ => None,
        }
    }

    /// Encode back into the raw triple (used by simulated engines)
    pub fn to_wire(&self) -> (&'static str, String, String) {
        let name = self.kind().wire_name();
        match self {
            EngineEvent::MicTestLevel { vu, peak } => {
                (name, format!("{}", vu / 100.0), format!("{}", peak / 100.0))
            }
            EngineEvent::FrequencyRxBegin { frequency_hz }
            | EngineEvent::FrequencyRxEnd { frequency_hz } => {
                (name, frequency_hz.to_string(), String::new())
            }
            EngineEvent::StationRxBegin {
                frequency_hz,
                callsign,
            } => (name, frequency_hz.to_string(), callsign.clone()),
            EngineEvent::StationTransceiversUpdated { station, count } => {
                (name, station.clone(), count.to_string())
            }
            EngineEvent::StationDataReceived {
                station,
                frequency_hz,
            } => (name, station.clone(), frequency_hz.to_string()),
            EngineEvent::PttState { active } => {
                (name, if *active { "1" } else { "0" }.to_string(), String::new())
            }
            EngineEvent::Error { message } => (name, message.clone(), String::new()),
            EngineEvent::NetworkConnected {
                callsign,
                is_atc,
                frequency_hz,
            } => (
                name,
                callsign.clone(),
                format!("{},{}", if *is_atc { 1 } else { 0 }, frequency_hz),
            ),
            EngineEvent::VoiceConnected
            | EngineEvent::VoiceDisconnected
            | EngineEvent::NetworkDisconnected => (name, String::new(), String::new()),
        }
    }
}

fn required(kind: &'static str, field: &'static str, value: &str) -> Result<String, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseError::MissingField { kind, field });
    }
    Ok(trimmed.to_string())
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ParseError> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(ParseError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_count(field: &'static str, value: &str) -> Result<u32, ParseError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Levels arrive as signed floats in 0.0..=1.0; scale to 0..=100
fn parse_level(field: &'static str, value: &str) -> Result<f32, ParseError> {
    let level = value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })?;
    Ok((level.abs() * 100.0).min(100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(EventKind::from_wire("MicTest"), EventKind::MicTestLevel);
        assert_eq!(EventKind::from_wire("VuMeter"), EventKind::MicTestLevel);
        assert_eq!(
            EventKind::from_wire("network-connected"),
            EventKind::NetworkConnected
        );
        assert_eq!(EventKind::from_wire("error"), EventKind::Error);
        assert_eq!(EventKind::from_wire("Bogus"), EventKind::Unknown);
        assert_eq!(EventKind::from_wire(""), EventKind::Unknown);
    }

    #[test]
    fn test_wire_names_classify_back() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_wire(kind.wire_name()), kind);
        }
    }

    #[test]
    fn test_decode_rx_begin() {
        let event = EngineEvent::decode("FrequencyRxBegin", "121500000", "").unwrap();
        assert_eq!(
            event,
            EngineEvent::FrequencyRxBegin {
                frequency_hz: 121_500_000
            }
        );
        assert_eq!(event.frequency_hz(), Some(121_500_000));
    }

    #[test]
    fn test_decode_network_connected() {
        let event = EngineEvent::decode("network-connected", "EGLL_TWR", "1,118500000").unwrap();
        assert_eq!(
            event,
            EngineEvent::NetworkConnected {
                callsign: "EGLL_TWR".to_string(),
                is_atc: true,
                frequency_hz: 118_500_000,
            }
        );

        let pilot = EngineEvent::decode("network-connected", "BAW123", "0,199998000").unwrap();
        assert!(matches!(
            pilot,
            EngineEvent::NetworkConnected { is_atc: false, .. }
        ));
    }

    #[test]
    fn test_decode_network_connected_malformed() {
        assert!(matches!(
            EngineEvent::decode("network-connected", "EGLL_TWR", "1"),
            Err(ParseError::InvalidNetworkPayload(_))
        ));
        assert!(matches!(
            EngineEvent::decode("network-connected", "EGLL_TWR", "x,118500000"),
            Err(ParseError::InvalidFlag { .. })
        ));
        assert!(matches!(
            EngineEvent::decode("network-connected", "EGLL_TWR", "1,abc"),
            Err(ParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            EngineEvent::decode("network-connected", "", "1,118500000"),
            Err(ParseError::MissingField { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        assert!(EngineEvent::decode("FrequencyRxEnd", "not-a-number", "").is_err());
        assert!(EngineEvent::decode("FrequencyRxEnd", "", "").is_err());
        assert!(EngineEvent::decode("StationTransceiversUpdated", "EGLL_TWR", "-1").is_err());
        assert!(EngineEvent::decode("PttState", "yes", "").is_err());
    }

    #[test]
    fn test_decode_error_keeps_message_verbatim() {
        assert_eq!(
            EngineEvent::decode("error", "  Audio device lost \n", "").unwrap(),
            EngineEvent::Error {
                message: "  Audio device lost \n".to_string()
            }
        );
        assert_eq!(
            EngineEvent::decode("error", "", "").unwrap(),
            EngineEvent::Error {
                message: String::new()
            }
        );
    }

    #[test]
    fn test_decode_unknown() {
        assert_eq!(
            EngineEvent::decode("SomethingNew", "a", "b"),
            Err(ParseError::UnknownEvent("SomethingNew".to_string()))
        );
    }

    #[test]
    fn test_mic_level_scaling() {
        let event = EngineEvent::decode("MicTest", "-0.25", "0.5").unwrap();
        assert_eq!(
            event,
            EngineEvent::MicTestLevel {
                vu: 25.0,
                peak: 50.0
            }
        );

        let clipped = EngineEvent::decode("MicTest", "3.0", "NaN");
        assert!(clipped.is_err());

        let loud = EngineEvent::decode("MicTest", "3.0", "1.0").unwrap();
        assert_eq!(
            loud,
            EngineEvent::MicTestLevel {
                vu: 100.0,
                peak: 100.0
            }
        );
    }

    #[test]
    fn test_wire_roundtrip_for_radio_events() {
        let event = EngineEvent::StationRxBegin {
            frequency_hz: 121_500_000,
            callsign: "BAW123".to_string(),
        };
        let (kind, a1, a2) = event.to_wire();
        assert_eq!(EngineEvent::decode(kind, &a1, &a2).unwrap(), event);

        let event = EngineEvent::NetworkConnected {
            callsign: "EGLL_TWR".to_string(),
            is_atc: true,
            frequency_hz: 118_500_000,
        };
        let (kind, a1, a2) = event.to_wire();
        assert_eq!(a2, "1,118500000");
        assert_eq!(EngineEvent::decode(kind, &a1, &a2).unwrap(), event);
    }
}
