//! Supported-PID bitmask decoding
//!
//! A "supported PIDs" response carries 32 bits per block. Bit 7 of byte `k`
//! flags PID `8k + 1`, bit 0 flags PID `8k + 8`.

use crate::error::{ElmError, ElmResult};
use crate::hex::pair_digits;

/// Hex digits per 32-bit availability block
const BLOCK_DIGITS: usize = 8;

/// Digest an availability hex string into bitmask bytes.
///
/// The length must be a multiple of 8 hex digits.
pub fn digest(availability: &str) -> ElmResult<Vec<u8>> {
    if availability.len() % BLOCK_DIGITS != 0 {
        return Err(ElmError::InvalidArgument(format!(
            "availability string length {} is not a multiple of {}: {:?}",
            availability.len(),
            BLOCK_DIGITS,
            availability
        )));
    }

    pair_digits(availability).ok_or_else(|| {
        ElmError::InvalidArgument(format!(
            "availability string contains non-hex characters: {:?}",
            availability
        ))
    })
}

/// Parse hex PID text. Malformed text is `InvalidArgument`; well-formed hex
/// that no PID byte can hold is `Internal`.
fn parse_pid(parameter_id: &str) -> ElmResult<u8> {
    let digits = parameter_id.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ElmError::InvalidArgument(format!(
            "parameter id {:?} is not hex",
            parameter_id
        )));
    }

    let significant = digits.trim_start_matches('0');
    let value = if significant.len() > 8 {
        None
    } else {
        u32::from_str_radix(digits, 16).ok()
    };
    value
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| ElmError::Internal(format!("parameter id {:?} exceeds FF", parameter_id)))
}

/// Byte index and bit mask addressing a PID within a bitmask
fn locate(pid: u8) -> ElmResult<(usize, u8)> {
    let offset = pid
        .checked_sub(1)
        .ok_or_else(|| ElmError::Internal(format!("PID {:02X} has no availability bit", pid)))?;
    Ok(((offset / 8) as usize, 0x80 >> (offset % 8)))
}

/// Is `parameter_id` (hex text, e.g. `"0C"`) flagged in the digested bitmask?
///
/// PIDs beyond the end of the bitmask are reported as unsupported.
pub fn is_available(parameter_id: &str, availability: &[u8]) -> ElmResult<bool> {
    let (index, mask) = locate(parse_pid(parameter_id)?)?;
    Ok(availability
        .get(index)
        .is_some_and(|byte| byte & mask == mask))
}

/// Digest `availability` and look up `parameter_id` in it.
pub fn is_available_hex(parameter_id: &str, availability: &str) -> ElmResult<bool> {
    is_available(parameter_id, &digest(availability)?)
}

/// Supported-PID set decoded from one or more consecutive availability blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidAvailability {
    /// PID preceding the first flagged one (0x00 for the `01 00` block)
    base: u8,
    /// Digested bitmask bytes
    bitmask: Vec<u8>,
}

impl PidAvailability {
    /// Wrap already-digested bitmask bytes starting after `base`.
    pub fn new(base: u8, bitmask: Vec<u8>) -> Self {
        Self { base, bitmask }
    }

    /// Digest a hex availability string starting after `base`.
    pub fn from_hex(base: u8, availability: &str) -> ElmResult<Self> {
        Ok(Self::new(base, digest(availability)?))
    }

    /// PID preceding the first one covered
    pub fn base(&self) -> u8 {
        self.base
    }

    /// Raw bitmask bytes
    pub fn bitmask(&self) -> &[u8] {
        &self.bitmask
    }

    /// Whether `pid` is flagged as supported
    pub fn supports(&self, pid: u8) -> bool {
        let Some(relative) = pid.checked_sub(self.base).filter(|r| *r > 0) else {
            return false;
        };
        locate(relative)
            .ok()
            .and_then(|(index, mask)| self.bitmask.get(index).map(|byte| byte & mask == mask))
            .unwrap_or(false)
    }

    /// All PIDs flagged as supported, in ascending order
    pub fn supported_pids(&self) -> impl Iterator<Item = u8> + '_ {
        self.bitmask.iter().enumerate().flat_map(move |(index, byte)| {
            (0..8u8).filter_map(move |bit| {
                let pid = self.base as usize + index * 8 + bit as usize + 1;
                (byte & (0x80 >> bit) != 0 && pid <= u8::MAX as usize).then_some(pid as u8)
            })
        })
    }

    /// Append the block that directly follows this one.
    ///
    /// Fails if `next` does not start where this bitmask ends.
    pub fn merge(&mut self, next: PidAvailability) -> ElmResult<()> {
        let expected = self.base as usize + self.bitmask.len() * 8;
        if next.base as usize != expected {
            return Err(ElmError::InvalidArgument(format!(
                "availability block at {:02X} does not follow block ending at {:02X}",
                next.base, expected
            )));
        }
        self.bitmask.extend(next.bitmask);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_digest_every_byte() {
        // Each pair lands at its own index, not always at index 0
        assert_eq!(digest("BE1FA813").unwrap(), vec![0xBE, 0x1F, 0xA8, 0x13]);
        assert_eq!(digest("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_digest_rejects_non_hex() {
        assert!(matches!(digest("BE1FA81G"), Err(ElmError::InvalidArgument(_))));
    }

    #[test]
    fn test_reference_bitmask() {
        let bytes = digest("BE1FA813").unwrap();
        // 0xBE = 1011 1110: PID 1 set, PID 2 clear, PID 3 set
        assert!(is_available("01", &bytes).unwrap());
        assert!(!is_available("02", &bytes).unwrap());
        assert!(is_available("03", &bytes).unwrap());
        // 0x1F = 0001 1111: PID 9 clear, PID 12 set
        assert!(!is_available("09", &bytes).unwrap());
        assert!(is_available("0C", &bytes).unwrap());
        // 0x13 = 0001 0011: PIDs 0x1C, 0x1F, 0x20
        assert!(is_available("20", &bytes).unwrap());
        assert!(!is_available("1D", &bytes).unwrap());
    }

    #[test]
    fn test_hex_convenience() {
        assert!(is_available_hex("0C", "BE1FA813").unwrap());
        assert!(matches!(is_available_hex("0C", "BE1FA8"), Err(ElmError::InvalidArgument(_))));
    }

    #[test]
    fn test_out_of_range_pid() {
        let bytes = digest("FFFFFFFF").unwrap();
        assert!(!is_available("21", &bytes).unwrap());
        assert!(matches!(is_available("00", &bytes), Err(ElmError::Internal(_))));
        assert!(matches!(is_available("XY", &bytes), Err(ElmError::InvalidArgument(_))));
    }

    #[test]
    fn test_pid_beyond_byte_range() {
        let bytes = digest("FFFFFFFF").unwrap();
        assert!(matches!(is_available("100", &bytes), Err(ElmError::Internal(_))));
        assert!(matches!(is_available("123456789ABC", &bytes), Err(ElmError::Internal(_))));
        // Leading zeros are still one byte
        assert!(is_available("0000000001", &bytes).unwrap());
        // Signs are not hex digits
        assert!(matches!(is_available("+0C", &bytes), Err(ElmError::InvalidArgument(_))));
        assert!(matches!(is_available("", &bytes), Err(ElmError::InvalidArgument(_))));
    }

    #[test]
    fn test_supported_pids_with_base() {
        let block = PidAvailability::from_hex(0x20, "80000001").unwrap();
        assert_eq!(block.supported_pids().collect::<Vec<_>>(), vec![0x21, 0x40]);
        assert!(block.supports(0x21));
        assert!(!block.supports(0x20));
        assert!(!block.supports(0x0C));
    }

    #[test]
    fn test_merge_consecutive_blocks() {
        let mut all = PidAvailability::from_hex(0x00, "BE1FA813").unwrap();
        all.merge(PidAvailability::from_hex(0x20, "80000000").unwrap())
            .unwrap();
        assert!(all.supports(0x0C));
        assert!(all.supports(0x21));
        assert!(all
            .merge(PidAvailability::from_hex(0x60, "80000000").unwrap())
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_digest_rejects_bad_length(text in "[0-9A-F]{1,40}") {
            prop_assume!(text.len() % 8 != 0);
            prop_assert!(matches!(digest(&text), Err(ElmError::InvalidArgument(_))));
        }

        #[test]
        fn prop_supported_pids_agree_with_lookup(bytes in proptest::collection::vec(any::<u8>(), 4..=4)) {
            let block = PidAvailability::new(0, bytes.clone());
            for pid in 1..=32u8 {
                let listed = block.supported_pids().any(|p| p == pid);
                prop_assert_eq!(listed, is_available(&format!("{:02X}", pid), &bytes).unwrap());
            }
        }
    }
}
