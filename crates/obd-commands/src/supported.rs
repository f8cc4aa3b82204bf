//! Supported-PID queries (`01 00`, `01 20`, ...)

use crate::error::CommandResult;
use crate::reading::{strip_header, PayloadDecoder, Reading, Value};
use elm_protocol::{CommandFrame, ElmError, ElmResult, Mode, PidAvailability};

/// Bitmask bytes in one availability block
const BLOCK_BYTES: usize = 4;

/// Query for the 32 PIDs following `base` (0x00, 0x20, ... 0xC0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailablePids {
    base: u8,
}

impl AvailablePids {
    pub fn new(base: u8) -> ElmResult<Self> {
        if base % 0x20 != 0 || base > 0xC0 {
            return Err(ElmError::InvalidArgument(format!(
                "availability block base {:02X} is not one of 00, 20, ... C0",
                base
            )));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> u8 {
        self.base
    }

    pub fn frame(&self) -> ElmResult<CommandFrame> {
        CommandFrame::new(Mode::CurrentData, Some(format!("{:02X}", self.base).as_str()))
    }

    /// Decode the bitmask without formatting it
    pub fn availability(&self, payload: &[u8]) -> CommandResult<PidAvailability> {
        let header = [Mode::CurrentData.response_header(), self.base];
        let data = strip_header("available-pids", payload, &header, BLOCK_BYTES)?;
        Ok(PidAvailability::new(self.base, data[..BLOCK_BYTES].to_vec()))
    }
}

impl PayloadDecoder for AvailablePids {
    fn decode_payload(&self, payload: &[u8], _imperial: bool) -> CommandResult<Reading> {
        let pids = self.availability(payload)?.supported_pids().collect();
        Ok(Reading::other("available-pids", Value::Pids(pids)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_block() {
        let query = AvailablePids::new(0x00).unwrap();
        let reading = query
            .decode_payload(&[0x41, 0x00, 0xBE, 0x1F, 0xA8, 0x13], false)
            .unwrap();
        let Value::Pids(pids) = reading.value else {
            panic!("expected PID list");
        };
        assert_eq!(pids[..4], [0x01, 0x03, 0x04, 0x05]);
        assert!(pids.contains(&0x0C));
        assert!(!pids.contains(&0x09));
        assert_eq!(pids.last(), Some(&0x20));
    }

    #[test]
    fn test_second_block_offset() {
        let query = AvailablePids::new(0x20).unwrap();
        let availability = query
            .availability(&[0x41, 0x20, 0x80, 0x00, 0x00, 0x01])
            .unwrap();
        assert!(availability.supports(0x21));
        assert!(availability.supports(0x40));
        assert!(!availability.supports(0x22));
    }

    #[test]
    fn test_invalid_base() {
        assert!(AvailablePids::new(0x10).is_err());
        assert!(AvailablePids::new(0xE0).is_err());
        assert_eq!(AvailablePids::new(0x40).unwrap().frame().unwrap().wire_text(), "01 40");
    }
}
