//! OBD-II Command Catalog
//!
//! Per-command formulas layered on the `elm-protocol` engine. Each command is
//! a [`CommandFrame`](elm_protocol::CommandFrame) plus a [`PayloadDecoder`]
//! that turns the decoded response bytes into a [`Reading`].

pub mod catalog;
mod command;
mod dtc;
mod error;
mod pid;
mod reading;
mod supported;

pub use command::{CommandOutcome, ObdCommand};
pub use dtc::{decode_dtc_bytes, ClearTroubleCodes, TroubleCodes};
pub use error::{CommandError, CommandResult};
pub use pid::Pid;
pub use reading::{PayloadDecoder, RawHex, Reading, Value};
pub use supported::AvailablePids;
