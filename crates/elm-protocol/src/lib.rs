//! ELM327 Protocol Engine
//!
//! This crate drives the ASCII command/response protocol spoken by
//! ELM327-compatible OBD-II adapters: command framing, prompt-terminated
//! response reading, noise normalization, adapter error classification,
//! hex decoding and supported-PID bitmask lookups.

pub mod availability;
pub mod classifier;
mod command;
mod error;
pub mod hex;
pub mod normalizer;
mod session;
mod transport;

pub use availability::PidAvailability;
pub use command::{CommandFrame, Mode};
pub use error::{AdapterFault, ElmError, ElmResult, ProtocolError};
pub use session::{CancelFlag, Exchange, ExchangeTiming, ProtocolSession};
pub use transport::{connect_tcp, open_serial, MockTransport, Transport};

/// Default baud rate for USB/serial ELM327 adapters
pub const DEFAULT_BAUD_RATE: u32 = 38400;
