//! ELM327 Error Types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure conditions reported by the adapter itself, in classification order.
///
/// The declaration order is the priority order used by the classifier: a
/// response matching several signatures is reported as the earliest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterFault {
    /// Adapter cannot reach the vehicle bus
    UnableToConnect,
    /// Bus initialization failed
    BusInit,
    /// Adapter did not understand the command syntax
    MisunderstoodCommand,
    /// No data available for the query
    NoData,
    /// Operation stopped before completion
    Stopped,
    /// Generic, unspecified adapter error
    UnknownError,
    /// Command or mode not supported by the vehicle
    UnsupportedCommand,
}

impl fmt::Display for AdapterFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AdapterFault::UnableToConnect => "unable to connect",
            AdapterFault::BusInit => "bus init error",
            AdapterFault::MisunderstoodCommand => "misunderstood command",
            AdapterFault::NoData => "no data",
            AdapterFault::Stopped => "stopped",
            AdapterFault::UnknownError => "unknown error",
            AdapterFault::UnsupportedCommand => "unsupported command",
        };
        f.write_str(text)
    }
}

/// An adapter-reported failure together with the command that provoked it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Adapter reported {fault} for command {command:?}")]
pub struct ProtocolError {
    /// Which signature matched
    pub fault: AdapterFault,
    /// Command text that was sent
    pub command: String,
}

impl ProtocolError {
    pub fn new(fault: AdapterFault, command: impl Into<String>) -> Self {
        Self {
            fault,
            command: command.into(),
        }
    }
}

/// Errors that can occur during an ELM327 exchange
#[derive(Debug, Error)]
pub enum ElmError {
    /// Malformed input detected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Normalized response contains characters outside `[0-9A-F]`
    #[error("Non-numeric response: {0:?}")]
    NonNumericResponse(String),

    /// Adapter reported an error condition
    #[error(transparent)]
    Adapter(#[from] ProtocolError),

    /// Exchange was cancelled while reading the response
    #[error("Exchange cancelled while awaiting response to {command:?}")]
    Cancelled { command: String },

    /// Internal consistency check failed
    #[error("Internal error: {0}")]
    Internal(String),

    /// Transport I/O failure, passed through untouched
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ElmError {
    /// Adapter fault kind, if this error came from the classifier
    pub fn fault(&self) -> Option<AdapterFault> {
        match self {
            ElmError::Adapter(err) => Some(err.fault),
            _ => None,
        }
    }
}

/// Convenience alias for ELM327 results.
pub type ElmResult<T> = Result<T, ElmError>;
