//! Hex-pair decoding of normalized responses

use crate::error::{ElmError, ElmResult};

/// Value of an uppercase hex digit
pub(crate) fn nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Pair uppercase hex digits into bytes, most significant nibble first.
///
/// A trailing unpaired digit is dropped. Returns `None` on any character
/// outside `[0-9A-F]`.
pub(crate) fn pair_digits(text: &str) -> Option<Vec<u8>> {
    let digits = text.as_bytes();
    if !digits.iter().all(|&d| nibble(d).is_some()) {
        return None;
    }

    digits
        .chunks_exact(2)
        .map(|pair| Some((nibble(pair[0])? << 4) | nibble(pair[1])?))
        .collect()
}

/// Decode normalized response text into payload bytes.
///
/// The text must be non-empty and consist only of `[0-9A-F]`; otherwise
/// [`ElmError::NonNumericResponse`] carries it back. Bytes keep transmission
/// order, and a trailing single digit is discarded.
pub fn decode(normalized: &str) -> ElmResult<Vec<u8>> {
    if normalized.is_empty() {
        return Err(ElmError::NonNumericResponse(String::new()));
    }

    pair_digits(normalized).ok_or_else(|| ElmError::NonNumericResponse(normalized.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }

    #[test]
    fn test_decode_rpm_response() {
        assert_eq!(decode("410C1AF8").unwrap(), vec![0x41, 0x0C, 0x1A, 0xF8]);
    }

    #[test]
    fn test_trailing_digit_dropped() {
        assert_eq!(decode("410").unwrap(), vec![0x41]);
        assert_eq!(decode("4").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_non_numeric_rejected() {
        match decode("?") {
            Err(ElmError::NonNumericResponse(text)) => assert_eq!(text, "?"),
            other => panic!("expected NonNumericResponse, got {:?}", other),
        }
        assert!(matches!(decode("41 0C"), Err(ElmError::NonNumericResponse(_))));
        assert!(matches!(decode("410c"), Err(ElmError::NonNumericResponse(_))));
        assert!(matches!(decode(""), Err(ElmError::NonNumericResponse(_))));
    }

    proptest! {
        #[test]
        fn prop_decoded_length_is_half(text in "[0-9A-F]{1,64}") {
            let bytes = decode(&text).unwrap();
            prop_assert_eq!(bytes.len(), text.len() / 2);
        }

        #[test]
        fn prop_even_length_round_trips(bytes in proptest::collection::vec(any::<u8>(), 1..32)) {
            let text = encode(&bytes);
            prop_assert_eq!(encode(&decode(&text).unwrap()), text);
        }
    }
}
