//! Named command catalog

use crate::command::ObdCommand;
use crate::dtc::{ClearTroubleCodes, TroubleCodes};
use crate::error::{CommandError, CommandResult};
use crate::pid::Pid;
use crate::reading::RawHex;
use crate::supported::AvailablePids;
use elm_protocol::CommandFrame;

/// Prefix for literal commands, e.g. `raw:01 0C`
const RAW_PREFIX: &str = "raw:";

const AVAILABILITY: [(&str, u8); 7] = [
    ("pids-01-20", 0x00),
    ("pids-21-40", 0x20),
    ("pids-41-60", 0x40),
    ("pids-61-80", 0x60),
    ("pids-81-a0", 0x80),
    ("pids-a1-c0", 0xA0),
    ("pids-c1-e0", 0xC0),
];

/// Every catalog name, in display order
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Pid::ALL.iter().map(Pid::name).collect();
    names.extend(AVAILABILITY.iter().map(|(name, _)| *name));
    names.extend(["dtc", "permanent-dtc", "clear-dtc"]);
    names
}

/// Look up a command by catalog name (case-insensitive)
pub fn lookup(name: &str) -> CommandResult<ObdCommand> {
    let key = name.trim().to_ascii_lowercase();

    if let Some(pid) = Pid::ALL.into_iter().find(|pid| pid.name() == key) {
        return Ok(ObdCommand::new(pid.name(), pid.frame()?, pid));
    }

    if let Some(&(name, base)) = AVAILABILITY.iter().find(|(n, _)| *n == key) {
        let query = AvailablePids::new(base)?;
        return Ok(ObdCommand::new(name, query.frame()?, query));
    }

    match key.as_str() {
        "dtc" => {
            let codes = TroubleCodes::stored();
            Ok(ObdCommand::new("dtc", codes.frame()?, codes))
        }
        "permanent-dtc" => {
            let codes = TroubleCodes::permanent();
            Ok(ObdCommand::new("permanent-dtc", codes.frame()?, codes))
        }
        "clear-dtc" => Ok(ObdCommand::new(
            "clear-dtc",
            ClearTroubleCodes.frame()?,
            ClearTroubleCodes,
        )),
        _ => Err(CommandError::UnknownCommand(name.to_string())),
    }
}

/// Resolve a catalog name or a `raw:` literal command
pub fn resolve(spec: &str) -> CommandResult<ObdCommand> {
    match spec.trim().strip_prefix(RAW_PREFIX) {
        Some(text) => Ok(ObdCommand::new("raw", CommandFrame::raw(text), RawHex)),
        None => lookup(spec),
    }
}
