//! OBD-II Command Error Types

use elm_protocol::ElmError;
use thiserror::Error;

/// Errors that can occur while running or decoding an OBD-II command
#[derive(Debug, Error)]
pub enum CommandError {
    /// Exchange with the adapter failed
    #[error(transparent)]
    Elm(#[from] ElmError),

    /// Response does not start with the expected mode/PID echo
    #[error("Unexpected response header for {name}: expected {expected:02X?}, got {actual:02X?}")]
    UnexpectedHeader {
        name: &'static str,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// Response is shorter than the formula needs
    #[error("{name}: need {expected} data bytes, got {actual}")]
    ShortPayload {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// No catalog entry with this name
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Convenience alias for command results.
pub type CommandResult<T> = Result<T, CommandError>;
