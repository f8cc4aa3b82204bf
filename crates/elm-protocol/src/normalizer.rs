//! Response Normalization
//!
//! Adapters interleave the payload with whitespace, echo and progress
//! markers. Two stages are exposed: [`compact`] keeps everything an error
//! signature may need, [`normalize`] additionally drops bus-init markers so
//! only payload hex should remain.

/// Progress markers emitted while the adapter negotiates the bus
const BUS_INIT_TOKENS: [&str; 3] = ["BUS INIT", "BUSINIT", "."];

/// Emitted while the adapter auto-detects the protocol
const SEARCHING_TOKEN: &str = "SEARCHING";

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Remove whitespace and `SEARCHING` markers.
///
/// This is the form the error classifier inspects, both for the whole
/// response and for each of its lines.
pub fn compact(raw: &str) -> String {
    let mut text = strip_whitespace(raw);
    loop {
        let next = strip_whitespace(&text.replace(SEARCHING_TOKEN, ""));
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Fully normalize raw adapter text.
///
/// Strips whitespace, `BUS INIT`, `BUSINIT`, `.` and `SEARCHING`, then
/// whitespace again. Passes repeat until the text is stable, so removing a
/// token can never splice a new one together and `normalize` is idempotent.
pub fn normalize(raw: &str) -> String {
    let mut text = strip_whitespace(raw);
    loop {
        let mut next = text.clone();
        for token in BUS_INIT_TOKENS {
            next = next.replace(token, "");
        }
        next = strip_whitespace(&next.replace(SEARCHING_TOKEN, ""));

        if next == text {
            return text;
        }
        text = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_searching_prefix() {
        assert_eq!(normalize(" SEARCHING...41 0C 1A F8 \r\r"), "410C1AF8");
    }

    #[test]
    fn test_bus_init_markers() {
        assert_eq!(normalize("BUS INIT: ...\r41 0D 37\r"), ":410D37");
        assert_eq!(normalize("BUSINIT...41 05 7B"), "41057B");
    }

    #[test]
    fn test_spliced_tokens_removed() {
        assert_eq!(normalize("BUS.INIT41 00"), "4100");
        assert_eq!(normalize("SEARCSEARCHINGHING4100"), "4100");
    }

    #[test]
    fn test_echo_kept() {
        assert_eq!(normalize("01 0C\r41 0C 1A F8\r"), "010C410C1AF8");
    }

    #[test]
    fn test_compact_keeps_bus_init() {
        assert_eq!(compact("SEARCHING...\rBUS INIT: ...ERROR\r"), "...BUSINIT:...ERROR");
    }

    #[test]
    fn test_unknown_text_passes_through() {
        assert_eq!(normalize("?"), "?");
        assert_eq!(normalize(""), "");
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(raw in "[0-9A-F BUSINITSEARCHG.\r\n\t?]{0,64}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_compact_idempotent(raw in "[0-9A-F SEARCHING\r\n]{0,64}") {
            let once = compact(&raw);
            prop_assert_eq!(compact(&once), once);
        }

        #[test]
        fn prop_normalized_has_no_noise(raw in "[0-9A-F BUSINITSEARCHG.\r\n]{0,64}") {
            let text = normalize(&raw);
            prop_assert!(!text.chars().any(char::is_whitespace));
            prop_assert!(!text.contains('.'));
            prop_assert!(!text.contains("BUSINIT"));
            prop_assert!(!text.contains("SEARCHING"));
        }
    }
}
