//! # Telecommand module
//!
//! Operator telecommands, typed on the operator console one per line. They are parsed as if they
//! were command line arguments, so `activate` and `idle` are subcommands of an implicit
//! program name.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A request from the operator to change the operating mode of the suit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
#[structopt(name = "tc")]
pub enum ModeTc {
    /// Arm the suit, entering active mode (also used to re-arm after an error).
    #[structopt(name = "activate")]
    Activate,

    /// Stop assisting and return to idle mode.
    #[structopt(name = "idle")]
    Idle,

    /// Stop every actuator and exit.
    #[structopt(name = "shutdown")]
    Shutdown,

    /// Report the current mode and the last fault.
    #[structopt(name = "status")]
    Status,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("Empty telecommand")]
    Empty,

    #[error("Invalid telecommand: {0}")]
    Invalid(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModeTc {
    /// Parse a telecommand from a single line of operator input.
    pub fn from_line(line: &str) -> Result<Self, TcParseError> {
        let words: Vec<&str> = line.split_whitespace().collect();

        if words.is_empty() {
            return Err(TcParseError::Empty);
        }

        ModeTc::from_iter_safe(std::iter::once("tc").chain(words))
            .map_err(|e| TcParseError::Invalid(e.to_string()))
    }
}
