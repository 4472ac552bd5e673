//! Path-segment escaping
//!
//! Identifiers are caller-controlled, so every identifier that becomes a
//! path component goes through [`encode_segment`]. The encoding is exact
//! percent-escaping (`%` is always escaped), which makes it injective and
//! reversible with [`decode_segment`].

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::KeyError;

/// Longest encoded segment accepted (common `NAME_MAX`)
pub const MAX_SEGMENT_LEN: usize = 255;

/// Bytes left as-is: ASCII alphanumerics plus `-`, `_` and `.`
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Escape an identifier into a single safe path component
///
/// Separators, control bytes, spaces, `%` and non-ASCII are
/// percent-encoded. A leading or trailing `.` is encoded as `%2E`, so the
/// result is never `.`, `..`, a hidden file or a name Windows would trim.
/// Reserved Windows device names (`CON`, `nul.txt`, `com1`, ...) get their
/// first byte escaped.
#[must_use]
pub fn encode_segment(raw: &str) -> String {
    let mut encoded = utf8_percent_encode(raw, SEGMENT).to_string();
    if let Some(rest) = encoded.strip_prefix('.') {
        encoded = format!("%2E{rest}");
    }
    if let Some(rest) = encoded.strip_suffix('.') {
        encoded = format!("{rest}%2E");
    }
    if is_device_name(&encoded) {
        let (first, rest) = encoded.split_at(1);
        encoded = format!("%{:02X}{rest}", first.as_bytes()[0]);
    }
    encoded
}

/// Whether the part before the first `.` is a reserved Windows device name
fn is_device_name(segment: &str) -> bool {
    let base = segment.split('.').next().unwrap_or(segment);
    match base.len() {
        3 => ["CON", "PRN", "AUX", "NUL"]
            .iter()
            .any(|name| base.eq_ignore_ascii_case(name)),
        4 => {
            let (prefix, digit) = base.split_at(3);
            (prefix.eq_ignore_ascii_case("COM") || prefix.eq_ignore_ascii_case("LPT"))
                && matches!(digit.as_bytes()[0], b'1'..=b'9')
        }
        _ => false,
    }
}

/// Reverse [`encode_segment`]
///
/// Returns `None` if the segment does not decode to UTF-8.
#[must_use]
pub fn decode_segment(encoded: &str) -> Option<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Encode and validate one identifier
pub(crate) fn checked_segment(field: &'static str, raw: &str) -> Result<String, KeyError> {
    crate::key::require_non_empty(field, raw)?;
    let encoded = encode_segment(raw);
    if encoded.len() > MAX_SEGMENT_LEN {
        return Err(KeyError::TooLong {
            field,
            len: encoded.len(),
            max: MAX_SEGMENT_LEN,
        });
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_identifiers_untouched() {
        assert_eq!(encode_segment("plantuml_a1b2"), "plantuml_a1b2");
        assert_eq!(encode_segment("diagram-1.png"), "diagram-1.png");
    }

    #[test]
    fn separators_are_escaped() {
        assert_eq!(encode_segment("Doc:Demo"), "Doc%3ADemo");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("a\\b"), "a%5Cb");
        assert_eq!(encode_segment("100%"), "100%25");
    }

    #[test]
    fn dot_segments_are_escaped() {
        assert_eq!(encode_segment("."), "%2E");
        assert_eq!(encode_segment(".."), "%2E%2E");
        assert_eq!(encode_segment(".hidden"), "%2Ehidden");
        assert_eq!(
            encode_segment("../../etc/passwd"),
            "%2E.%2F..%2Fetc%2Fpasswd"
        );
    }

    #[test]
    fn trailing_dot_and_space_are_escaped() {
        assert_eq!(encode_segment("a."), "a%2E");
        assert_eq!(encode_segment("a "), "a%20");
        assert_eq!(encode_segment("a.b"), "a.b");
        assert_ne!(encode_segment("diagram."), encode_segment("diagram"));
        assert_ne!(encode_segment("diagram "), encode_segment("diagram"));
    }

    #[test]
    fn device_names_are_escaped() {
        assert_eq!(encode_segment("CON"), "%43ON");
        assert_eq!(encode_segment("nul.txt"), "%6Eul.txt");
        assert_eq!(encode_segment("com1"), "%63om1");
        assert_eq!(encode_segment("LPT9.png"), "%4CPT9.png");
        assert_eq!(decode_segment("%43ON").as_deref(), Some("CON"));
    }

    #[test]
    fn device_name_lookalikes_untouched() {
        assert_eq!(encode_segment("CONSOLE"), "CONSOLE");
        assert_eq!(encode_segment("com0"), "com0");
        assert_eq!(encode_segment("lpt10"), "lpt10");
        assert_eq!(encode_segment("auxiliary.png"), "auxiliary.png");
    }

    #[test]
    fn underscore_and_colon_do_not_collide() {
        assert_ne!(encode_segment("Doc:Demo"), encode_segment("Doc_Demo"));
    }

    #[test]
    fn decode_reverses_escapes() {
        assert_eq!(decode_segment("%2E.%2Fx").as_deref(), Some("../x"));
        assert_eq!(decode_segment("%FF"), None);
    }

    #[test]
    fn checked_segment_limits() {
        assert!(matches!(
            checked_segment("artifact id", ""),
            Err(KeyError::Empty { .. })
        ));
        let long = "/".repeat(100);
        assert!(matches!(
            checked_segment("artifact id", &long),
            Err(KeyError::TooLong { len: 300, .. })
        ));
        assert!(checked_segment("artifact id", &"a".repeat(MAX_SEGMENT_LEN)).is_ok());
    }

    proptest! {
        #[test]
        fn encoded_is_single_safe_component(raw in ".*") {
            let enc = encode_segment(&raw);
            prop_assert!(!enc.contains('/'));
            prop_assert!(!enc.contains('\\'));
            prop_assert!(!enc.contains('\0'));
            prop_assert!(!enc.starts_with('.'));
            prop_assert!(!enc.ends_with('.'));
            prop_assert!(!enc.ends_with(' '));
            prop_assert!(!is_device_name(&enc));
        }

        #[test]
        fn encoding_round_trips(raw in ".*") {
            prop_assert_eq!(decode_segment(&encode_segment(&raw)), Some(raw));
        }

        #[test]
        fn encoding_is_injective(a in ".{0,12}", b in ".{0,12}") {
            prop_assume!(a != b);
            prop_assert_ne!(encode_segment(&a), encode_segment(&b));
        }
    }
}
