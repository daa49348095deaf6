use std::borrow::Cow;

use memchr::memchr;

/// Normalize line endings the way an XML processor must (XML 1.0, section 2.11):
/// every `\r\n` pair and every lone `\r` becomes `\n`.
///
/// Must be applied to the raw character data *before* entity references are expanded, so that
/// an escaped carriage return (`&#13;`) survives.
///
/// This function is optimized for the case where no replacements are made.
pub fn normalize_line_endings(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let Some(first) = memchr(b'\r', bytes) else {
        return Cow::Borrowed(input);
    };

    let mut result = String::with_capacity(input.len());
    result.push_str(&input[..first]);

    let mut rest = &input[first..];
    while let Some(pos) = memchr(b'\r', rest.as_bytes()) {
        result.push_str(&rest[..pos]);
        result.push('\n');
        // a `\r\n` pair collapses into the single `\n` pushed above
        let skip = if rest.as_bytes().get(pos + 1) == Some(&b'\n') {
            2
        } else {
            1
        };
        rest = &rest[pos + skip..];
    }
    result.push_str(rest);

    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn borrows_when_nothing_to_replace() {
        let input = "[[Category:TestDiff]]\n\nLorem ipsum.";
        assert!(matches!(normalize_line_endings(input), Cow::Borrowed(s) if s == input));
    }

    #[test]
    fn replaces_crlf_and_lone_cr() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(normalize_line_endings("\r\r\n\r"), "\n\n\n");
        assert_eq!(normalize_line_endings("\r\n\r\n"), "\n\n");
        assert_eq!(normalize_line_endings("ü\r\nß"), "ü\nß");
    }

    proptest! {
        #[test]
        fn never_leaves_carriage_returns(input in "[a-c\r\n]{0,40}") {
            let normalized = normalize_line_endings(&input);
            prop_assert!(!normalized.contains('\r'));
            // one `\n` per line break of the input
            let breaks = input.replace("\r\n", "\n").chars().filter(|c| *c == '\r' || *c == '\n').count();
            prop_assert_eq!(normalized.matches('\n').count(), breaks);
        }
    }
}
