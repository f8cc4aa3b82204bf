//! Adapter Error Classification
//!
//! Signatures are tested in a fixed priority order and the first match
//! wins. Connection-level failures come first so that a response which also
//! happens to contain a negative-response pattern is still reported as the
//! connection failure.
//!
//! Most signatures are searched for in the whole compacted response. The
//! negative-response signature must fill a response line on its own, since
//! the same digits are legal inside a hex payload.

use crate::error::{AdapterFault, ProtocolError};
use crate::normalizer;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Which part of the response a signature is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// The whole response, compacted
    Response,
    /// Any single line, compacted
    Line,
}

/// Ordered signature table, matched against compacted uppercase text
const SIGNATURES: [(AdapterFault, Scope, &str); 7] = [
    (AdapterFault::UnableToConnect, Scope::Response, r"UNABLETOCONNECT"),
    (AdapterFault::BusInit, Scope::Response, r"BUSINIT:?\.*ERROR"),
    // A bare "?" carries no echo and is left for the hex check to reject
    (AdapterFault::MisunderstoodCommand, Scope::Response, r"^.+\?$"),
    (AdapterFault::NoData, Scope::Response, r"NODATA"),
    (AdapterFault::Stopped, Scope::Response, r"STOPPED"),
    (AdapterFault::UnknownError, Scope::Response, r"ERROR"),
    (AdapterFault::UnsupportedCommand, Scope::Line, r"^7F0[0-9A]1[12]$"),
];

fn matchers() -> &'static [(AdapterFault, Scope, Regex)] {
    static MATCHERS: OnceLock<Vec<(AdapterFault, Scope, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        SIGNATURES
            .iter()
            .map(|&(fault, scope, pattern)| {
                let regex = Regex::new(pattern).expect("signature patterns are valid");
                (fault, scope, regex)
            })
            .collect()
    })
}

fn compact_upper(text: &str) -> String {
    normalizer::compact(text).to_ascii_uppercase()
}

/// Return the first adapter fault whose signature matches `text`.
///
/// `text` is the response as read, with its line breaks intact.
pub fn detect(text: &str) -> Option<AdapterFault> {
    let response = compact_upper(text);
    let lines: Vec<String> = text
        .split(['\r', '\n'])
        .map(compact_upper)
        .filter(|line| !line.is_empty())
        .collect();

    matchers()
        .iter()
        .find(|(_, scope, regex)| match scope {
            Scope::Response => regex.is_match(&response),
            Scope::Line => lines.iter().any(|line| regex.is_match(line)),
        })
        .map(|&(fault, _, _)| fault)
}

/// Check a response for adapter-reported errors.
///
/// Passes silently when no signature matches.
pub fn classify(text: &str, command: &str) -> Result<(), ProtocolError> {
    match detect(text) {
        Some(fault) => {
            warn!("Adapter reported {} for {:?}: {:?}", fault, command, text);
            Err(ProtocolError::new(fault, command))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_signature() {
        let cases = [
            ("UNABLETOCONNECT", AdapterFault::UnableToConnect),
            ("BUSINIT:...ERROR", AdapterFault::BusInit),
            ("BUSINIT...ERROR", AdapterFault::BusInit),
            ("010C?", AdapterFault::MisunderstoodCommand),
            ("NODATA", AdapterFault::NoData),
            ("STOPPED", AdapterFault::Stopped),
            ("CANERROR", AdapterFault::UnknownError),
            ("7F0112", AdapterFault::UnsupportedCommand),
        ];
        for (text, expected) in cases {
            assert_eq!(detect(text), Some(expected), "text {:?}", text);
        }
    }

    #[test]
    fn test_first_match_wins() {
        // Matches both the connection and the negative-response signatures
        let err = classify("UNABLE TO CONNECT\r7F 01 12\r", "01 0C").unwrap_err();
        assert_eq!(err.fault, AdapterFault::UnableToConnect);
        assert_eq!(err.command, "01 0C");

        // Bus init errors also contain ERROR
        assert_eq!(detect("BUSINIT:...ERROR"), Some(AdapterFault::BusInit));
    }

    #[test]
    fn test_whitespace_and_case_insensitive() {
        assert_eq!(detect("no data"), Some(AdapterFault::NoData));
        assert_eq!(detect("UNABLE TO CONNECT"), Some(AdapterFault::UnableToConnect));
    }

    #[test]
    fn test_clean_responses_pass() {
        assert!(classify("410C1AF8", "01 0C").is_ok());
        assert!(classify("4100BE1FA813", "01 00").is_ok());
        assert!(classify("", "01 00").is_ok());
    }

    #[test]
    fn test_negative_response_needs_own_line() {
        assert_eq!(detect("7F 01 12\r\r"), Some(AdapterFault::UnsupportedCommand));
        assert_eq!(detect("SEARCHING...\r7F 0A 11\r"), Some(AdapterFault::UnsupportedCommand));

        // The same digits inside a payload are data
        assert_eq!(detect("41 00 7F 01 12 00\r\r"), None);
        assert_eq!(detect("41 10 7F 01 12\r\r"), None);
        assert_eq!(detect("7F 01 12 00"), None);
    }

    #[test]
    fn test_bare_question_mark_not_classified() {
        assert_eq!(detect("?"), None);
    }
}
