//! Diagnostic trouble code commands (modes 03, 04 and 0A)

use crate::error::CommandResult;
use crate::reading::{strip_header, PayloadDecoder, Reading, Value};
use elm_protocol::{CommandFrame, ElmResult, Mode};

/// Decode two raw bytes into a standard DTC code string (e.g., "P0300").
///
/// Returns `None` for the `00 00` padding pair.
pub fn decode_dtc_bytes(b1: u8, b2: u8) -> Option<String> {
    if b1 == 0x00 && b2 == 0x00 {
        return None;
    }

    let category = match b1 >> 6 {
        0 => 'P',
        1 => 'C',
        2 => 'B',
        _ => 'U',
    };

    Some(format!(
        "{}{}{:X}{:X}{:X}",
        category,
        (b1 >> 4) & 0x03,
        b1 & 0x0F,
        b2 >> 4,
        b2 & 0x0F
    ))
}

/// Read stored (03) or permanent (0A) trouble codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TroubleCodes {
    mode: Mode,
}

impl TroubleCodes {
    pub fn stored() -> Self {
        Self {
            mode: Mode::StoredDiagnosticCodes,
        }
    }

    pub fn permanent() -> Self {
        Self {
            mode: Mode::PermanentDiagnosticCodes,
        }
    }

    pub fn frame(&self) -> ElmResult<CommandFrame> {
        CommandFrame::new(self.mode, None)
    }
}

impl PayloadDecoder for TroubleCodes {
    fn decode_payload(&self, payload: &[u8], _imperial: bool) -> CommandResult<Reading> {
        let mut data = strip_header("trouble-codes", payload, &[self.mode.response_header()], 0)?;

        // CAN adapters prefix the code pairs with a count byte
        if data.len() % 2 == 1 {
            data = &data[1..];
        }

        let codes = data
            .chunks_exact(2)
            .filter_map(|pair| decode_dtc_bytes(pair[0], pair[1]))
            .collect();
        Ok(Reading::other("trouble-codes", Value::Codes(codes)))
    }
}

/// Clear stored trouble codes (04)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearTroubleCodes;

impl ClearTroubleCodes {
    pub fn frame(&self) -> ElmResult<CommandFrame> {
        CommandFrame::new(Mode::ClearDiagnosticCodes, None)
    }
}

impl PayloadDecoder for ClearTroubleCodes {
    fn decode_payload(&self, payload: &[u8], _imperial: bool) -> CommandResult<Reading> {
        strip_header(
            "clear-codes",
            payload,
            &[Mode::ClearDiagnosticCodes.response_header()],
            0,
        )?;
        Ok(Reading::other("clear-codes", Value::Text("OK".to_string())))
    }
}
