//! Line-oriented command console.
//!
//! The firmware reads newline-terminated commands from the serial console
//! and answers each with one line of JSON:
//!
//! | Input                 | Reply                                   |
//! |-----------------------|-----------------------------------------|
//! | `status`              | status object                           |
//! | `mode <code>`         | `{"message": "<mode label>"}`           |
//! | `led <name> on\|off`  | `{"message": "<name> LED turned on"}`   |
//! | `help`                | `{"message": "<usage>"}`                |
//!
//! Any rejection is `{"error": "<reason>"}`.  Keywords are
//! case-insensitive.  Parsing never allocates beyond the owned strings
//! placed in the resulting [`AppCommand`].

use core::fmt;

use heapless::Vec;
use serde::Serialize;

use crate::app::commands::{AppCommand, AppResponse};
use crate::error::CommandError;

/// Longest accepted command, in tokens.
const MAX_TOKENS: usize = 3;

pub const USAGE: &str = "commands: status | mode <1-12> | led <name> on|off | help";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    App(AppCommand),
    Help,
}

/// Why a console line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingArgument(&'static str),
    TooManyArguments,
    InvalidState(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand(c) => write!(f, "unknown command '{c}'"),
            Self::MissingArgument(what) => write!(f, "missing {what}"),
            Self::TooManyArguments => write!(f, "too many arguments"),
            Self::InvalidState(s) => write!(f, "invalid state '{s}', expected on or off"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one console line.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut tokens: Vec<&str, MAX_TOKENS> = Vec::new();
    for token in line.split_whitespace() {
        tokens.push(token).map_err(|_| ParseError::TooManyArguments)?;
    }

    let Some((&keyword, args)) = tokens.split_first() else {
        return Err(ParseError::Empty);
    };

    let cmd = if keyword.eq_ignore_ascii_case("status") {
        no_args(args)?;
        ConsoleCommand::App(AppCommand::GetStatus)
    } else if keyword.eq_ignore_ascii_case("help") {
        no_args(args)?;
        ConsoleCommand::Help
    } else if keyword.eq_ignore_ascii_case("mode") {
        match args {
            [] => return Err(ParseError::MissingArgument("mode code")),
            [code] => ConsoleCommand::App(AppCommand::SetFaultMode((*code).to_owned())),
            _ => return Err(ParseError::TooManyArguments),
        }
    } else if keyword.eq_ignore_ascii_case("led") {
        match args {
            [] => return Err(ParseError::MissingArgument("LED name")),
            [_] => return Err(ParseError::MissingArgument("on|off")),
            [name, state] => ConsoleCommand::App(AppCommand::SetActuator {
                name: (*name).to_owned(),
                on: parse_state(state)?,
            }),
            _ => return Err(ParseError::TooManyArguments),
        }
    } else {
        return Err(ParseError::UnknownCommand(keyword.to_owned()));
    };
    Ok(cmd)
}

fn no_args(args: &[&str]) -> Result<(), ParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ParseError::TooManyArguments)
    }
}

fn parse_state(s: &str) -> Result<bool, ParseError> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        _ => Err(ParseError::InvalidState(s.to_owned())),
    }
}

#[derive(Serialize)]
struct ErrorReply<'a> {
    error: &'a str,
}

/// Render a command outcome as one JSON line (no trailing newline).
pub fn render(outcome: &Result<AppResponse, CommandError>) -> String {
    match outcome {
        Ok(response) => to_json(response),
        Err(e) => render_error(&e.to_string()),
    }
}

/// Render an error reply.
pub fn render_error(message: &str) -> String {
    to_json(&ErrorReply { error: message })
}

/// Render the usage reply.
pub fn render_help() -> String {
    to_json(&AppResponse::message(USAGE))
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!("{{\"error\":\"serialisation failed: {e}\"}}"))
}
