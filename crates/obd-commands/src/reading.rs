//! Decoded readings and the per-command decoding capability

use crate::error::{CommandError, CommandResult};
use serde::Serialize;
use std::fmt;

/// Value produced by a formula
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Scalar measurement
    Number(f64),
    /// Free-form text (raw hex, acknowledgements)
    Text(String),
    /// Diagnostic trouble codes such as "P0133"
    Codes(Vec<String>),
    /// Supported parameter ids
    Pids(Vec<u8>),
}

/// A formatted command result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Catalog name of the command
    pub name: &'static str,
    pub value: Value,
    /// Unit symbol, empty when unitless
    pub unit: &'static str,
    /// Decimal places used when displaying numbers
    #[serde(skip)]
    pub precision: usize,
}

impl Reading {
    pub fn number(name: &'static str, value: f64, unit: &'static str, precision: usize) -> Self {
        Self {
            name,
            value: Value::Number(value),
            unit,
            precision,
        }
    }

    pub fn other(name: &'static str, value: Value) -> Self {
        Self {
            name,
            value,
            unit: "",
            precision: 0,
        }
    }

    /// Numeric value, if this reading is a measurement
    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            Value::Number(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Number(v) if self.unit.is_empty() => write!(f, "{:.*}", self.precision, v),
            Value::Number(v) => write!(f, "{:.*} {}", self.precision, v, self.unit),
            Value::Text(text) => f.write_str(text),
            Value::Codes(codes) if codes.is_empty() => f.write_str("no codes"),
            Value::Codes(codes) => f.write_str(&codes.join(", ")),
            Value::Pids(pids) => {
                let listed: Vec<String> = pids.iter().map(|p| format!("{:02X}", p)).collect();
                f.write_str(&listed.join(" "))
            }
        }
    }
}

/// Turns the decoded payload of one command into a reading.
///
/// `imperial` asks for imperial units where the formula has them.
pub trait PayloadDecoder: Send + Sync {
    fn decode_payload(&self, payload: &[u8], imperial: bool) -> CommandResult<Reading>;
}

/// Strip the positive-response `header` from `payload` and check that at
/// least `min_len` data bytes follow.
pub(crate) fn strip_header<'a>(
    name: &'static str,
    payload: &'a [u8],
    header: &[u8],
    min_len: usize,
) -> CommandResult<&'a [u8]> {
    if !payload.starts_with(header) {
        return Err(CommandError::UnexpectedHeader {
            name,
            expected: header.to_vec(),
            actual: payload.iter().take(header.len()).copied().collect(),
        });
    }

    let data = &payload[header.len()..];
    if data.len() < min_len {
        return Err(CommandError::ShortPayload {
            name,
            expected: min_len,
            actual: data.len(),
        });
    }
    Ok(data)
}

/// Passes the payload through as uppercase hex
#[derive(Debug, Clone, Copy, Default)]
pub struct RawHex;

impl PayloadDecoder for RawHex {
    fn decode_payload(&self, payload: &[u8], _imperial: bool) -> CommandResult<Reading> {
        let text = payload.iter().map(|b| format!("{:02X}", b)).collect();
        Ok(Reading::other("raw", Value::Text(text)))
    }
}
