//! Outgoing command framing
//!
//! A [`CommandFrame`] is the exact ASCII text sent to the adapter (minus the
//! carriage return), plus the mode and parameter id it addresses.

use crate::error::{ElmError, ElmResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// OBD-II service modes understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Current data (0x01)
    CurrentData,
    /// Freeze frame data (0x02)
    FreezeFrame,
    /// Stored diagnostic trouble codes (0x03)
    StoredDiagnosticCodes,
    /// Clear trouble codes (0x04)
    ClearDiagnosticCodes,
    /// Vehicle information (0x09)
    VehicleInformation,
    /// Permanent diagnostic trouble codes (0x0A)
    PermanentDiagnosticCodes,
}

impl Mode {
    /// All modes, in table order
    pub const ALL: [Mode; 6] = [
        Mode::CurrentData,
        Mode::FreezeFrame,
        Mode::StoredDiagnosticCodes,
        Mode::ClearDiagnosticCodes,
        Mode::VehicleInformation,
        Mode::PermanentDiagnosticCodes,
    ];

    /// Two-character code sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Mode::CurrentData => "01",
            Mode::FreezeFrame => "02",
            Mode::StoredDiagnosticCodes => "03",
            Mode::ClearDiagnosticCodes => "04",
            Mode::VehicleInformation => "09",
            Mode::PermanentDiagnosticCodes => "0A",
        }
    }

    /// Whether requests in this mode carry a parameter id
    pub fn uses_parameter(&self) -> bool {
        matches!(
            self,
            Mode::CurrentData | Mode::FreezeFrame | Mode::VehicleInformation
        )
    }

    /// First byte of a positive response (mode + 0x40)
    pub fn response_header(&self) -> u8 {
        match self {
            Mode::CurrentData => 0x41,
            Mode::FreezeFrame => 0x42,
            Mode::StoredDiagnosticCodes => 0x43,
            Mode::ClearDiagnosticCodes => 0x44,
            Mode::VehicleInformation => 0x49,
            Mode::PermanentDiagnosticCodes => 0x4A,
        }
    }

    /// Look up a mode by its wire code
    pub fn from_code(code: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|mode| mode.code() == code)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One outgoing request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandFrame {
    mode: Option<Mode>,
    parameter_id: Option<String>,
    wire_text: String,
}

impl CommandFrame {
    /// Build a frame from a mode and an optional parameter id.
    ///
    /// Fails with [`ElmError::InvalidArgument`] if the mode requires a
    /// parameter id and none (or a malformed one) is given. A parameter id
    /// passed to a mode that takes none is ignored.
    pub fn new(mode: Mode, parameter_id: Option<&str>) -> ElmResult<Self> {
        if !mode.uses_parameter() {
            if let Some(pid) = parameter_id {
                debug!("Mode {} takes no parameter, ignoring {:?}", mode, pid);
            }
            return Ok(Self {
                mode: Some(mode),
                parameter_id: None,
                wire_text: mode.code().to_string(),
            });
        }

        let pid = parameter_id.ok_or_else(|| {
            ElmError::InvalidArgument(format!(
                "mode {} requires a parameter id, none given",
                mode
            ))
        })?;

        if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ElmError::InvalidArgument(format!(
                "malformed parameter id {:?} for mode {}",
                pid, mode
            )));
        }

        Ok(Self {
            mode: Some(mode),
            parameter_id: Some(pid.to_string()),
            wire_text: format!("{} {}", mode.code(), pid),
        })
    }

    /// Build a frame from literal command text such as `"01 0C"`.
    ///
    /// The mode is inferred from the first two characters; unknown modes are
    /// still sent, but `mode()` and `parameter_id()` then return `None`.
    pub fn raw(text: &str) -> Self {
        let wire_text = text.trim().to_string();
        let mode = wire_text.get(..2).and_then(Mode::from_code);

        let parameter_id = match mode {
            Some(m) if m.uses_parameter() => wire_text
                .get(2..)
                .map(str::trim_start)
                .filter(|pid| !pid.is_empty())
                .map(str::to_string),
            _ => None,
        };

        Self {
            mode,
            parameter_id,
            wire_text,
        }
    }

    /// Mode this frame addresses, if known
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Two-character mode code, if the mode is known
    pub fn mode_code(&self) -> Option<&'static str> {
        self.mode.map(|m| m.code())
    }

    /// Parameter id, present iff the mode uses one
    pub fn parameter_id(&self) -> Option<&str> {
        self.parameter_id.as_deref()
    }

    /// Exact text transmitted before the carriage return
    pub fn wire_text(&self) -> &str {
        &self.wire_text
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_text)
    }
}
