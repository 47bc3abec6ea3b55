//! Console command parsing

use afv_protocol::{parse_frequency, HardwareType};
use afv_session::{FrequencyState, PttSlot};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  connect                              start voice
  disconnect                           stop voice
  add <freq> <callsign>                add a radio (MHz like 121.5 or Hz)
  remove <freq>                        remove a radio
  state <freq> <rx> <tx> <xc> <spk> [xca]
                                       set radio flags (on/off, 1/0)
  gain <0-100>                         radio gain
  hw <0-2>                             hardware profile
  cid <cid>                            network user id
  password <password>                  network password
  bind <1|2>                           bind the next key pressed to a PTT slot
  cancel <1|2>                         stop waiting for a key
  station <callsign>                   add a station's frequencies
  refresh <callsign>                   refresh a station's transceivers
  mictest start|stop                   microphone level test
  status                               show session and radios
  help                                 this text
  quit                                 exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Connect,
    Disconnect,
    Add { frequency_hz: u32, callsign: String },
    Remove { frequency_hz: u32 },
    State { frequency_hz: u32, state: FrequencyState },
    Gain(u8),
    Hardware(HardwareType),
    Cid(String),
    Password(String),
    Bind(PttSlot),
    CancelBind(PttSlot),
    Station(String),
    RefreshStation(String),
    MicTest(bool),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConsoleError {
    #[error("unknown command: {0} (try `help`)")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Parse(#[from] afv_protocol::ParseError),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name.to_ascii_lowercase().as_str() {
        "connect" => ConsoleCommand::Connect,
        "disconnect" => ConsoleCommand::Disconnect,
        "add" => match args.as_slice() {
            [freq, callsign] => ConsoleCommand::Add {
                frequency_hz: parse_frequency(freq)?,
                callsign: callsign.to_string(),
            },
            _ => return Err(ConsoleError::Usage("add <freq> <callsign>")),
        },
        "remove" | "rm" => match args.as_slice() {
            [freq] => ConsoleCommand::Remove {
                frequency_hz: parse_frequency(freq)?,
            },
            _ => return Err(ConsoleError::Usage("remove <freq>")),
        },
        "state" => parse_state(&args)?,
        "gain" => match args.as_slice() {
            [pct] => ConsoleCommand::Gain(
                pct.parse::<u8>()
                    .ok()
                    .filter(|p| *p <= 100)
                    .ok_or_else(|| invalid("gain", pct))?,
            ),
            _ => return Err(ConsoleError::Usage("gain <0-100>")),
        },
        "hw" | "hardware" => match args.as_slice() {
            [n] => ConsoleCommand::Hardware(
                n.parse::<i32>()
                    .ok()
                    .and_then(HardwareType::from_index)
                    .ok_or_else(|| invalid("hardware", n))?,
            ),
            _ => return Err(ConsoleError::Usage("hw <0-2>")),
        },
        "cid" => match args.as_slice() {
            [cid] => ConsoleCommand::Cid(cid.to_string()),
            _ => return Err(ConsoleError::Usage("cid <cid>")),
        },
        "password" | "pw" => match args.as_slice() {
            [password] => ConsoleCommand::Password(password.to_string()),
            _ => return Err(ConsoleError::Usage("password <password>")),
        },
        "bind" => ConsoleCommand::Bind(parse_slot(&args, "bind <1|2>")?),
        "cancel" => ConsoleCommand::CancelBind(parse_slot(&args, "cancel <1|2>")?),
        "station" => match args.as_slice() {
            [callsign] => ConsoleCommand::Station(callsign.to_string()),
            _ => return Err(ConsoleError::Usage("station <callsign>")),
        },
        "refresh" => match args.as_slice() {
            [callsign] => ConsoleCommand::RefreshStation(callsign.to_string()),
            _ => return Err(ConsoleError::Usage("refresh <callsign>")),
        },
        "mictest" => match args.as_slice() {
            ["start"] => ConsoleCommand::MicTest(true),
            ["stop"] => ConsoleCommand::MicTest(false),
            _ => return Err(ConsoleError::Usage("mictest start|stop")),
        },
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    };

    Ok(Some(command))
}

fn invalid(field: &'static str, value: &str) -> ConsoleError {
    ConsoleError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

fn parse_slot(args: &[&str], usage: &'static str) -> Result<PttSlot, ConsoleError> {
    match args {
        [n] => n
            .parse::<u8>()
            .ok()
            .and_then(PttSlot::from_number)
            .ok_or_else(|| invalid("slot", n)),
        _ => Err(ConsoleError::Usage(usage)),
    }
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ConsoleError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" | "y" => Ok(true),
        "0" | "off" | "false" | "no" | "n" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

fn parse_state(args: &[&str]) -> Result<ConsoleCommand, ConsoleError> {
    const USAGE: &str = "state <freq> <rx> <tx> <xc> <spk> [xca]";

    let (freq, rx, tx, xc, spk, xca) = match args {
        [freq, rx, tx, xc, spk] => (freq, rx, tx, xc, spk, None),
        [freq, rx, tx, xc, spk, xca] => (freq, rx, tx, xc, spk, Some(xca)),
        _ => return Err(ConsoleError::Usage(USAGE)),
    };

    Ok(ConsoleCommand::State {
        frequency_hz: parse_frequency(freq)?,
        state: FrequencyState {
            rx: parse_flag("rx", rx)?,
            tx: parse_flag("tx", tx)?,
            xc: parse_flag("xc", xc)?,
            on_speaker: parse_flag("spk", spk)?,
            cross_couple_across: match xca {
                Some(v) => parse_flag("xca", v)?,
                None => false,
            },
        },
    })
}
