//! String escaping and qualified-name helpers shared by the lexer and the
//! later stages.

use std::ops::Range;

/// Escape a string so it can be written between quotes in DBML source.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

/// Result of processing escape sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unescaped {
    pub value: String,
    /// Byte ranges (relative to the input) of malformed escape sequences.
    pub invalid: Vec<Range<usize>>,
}

/// Process escape sequences, recording malformed `\u` escapes.
///
/// Unknown escapes stand for the escaped character itself. A malformed
/// `\u` escape is kept literally.
pub fn unescape(s: &str) -> Unescaped {
    let mut result = Unescaped::default();
    let mut chars = s.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c != '\\' {
            result.value.push(c);
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            // A lone trailing backslash stands for itself.
            result.value.push('\\');
            break;
        };
        match escaped {
            'n' => result.value.push('\n'),
            't' => result.value.push('\t'),
            'r' => result.value.push('\r'),
            'b' => result.value.push('\u{8}'),
            'f' => result.value.push('\u{c}'),
            'v' => result.value.push('\u{b}'),
            '0' => result.value.push('\0'),
            'u' => {
                let digits: String = s[start + 2..].chars().take(4).collect();
                let decoded = (digits.len() == 4 && digits.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        result.value.push(ch);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    None => {
                        result.value.push_str("\\u");
                        result.invalid.push(start..start + 2);
                    }
                }
            }
            other => result.value.push(other),
        }
    }
    result
}

/// Inverse of [`escape_string`].
pub fn unescape_string(s: &str) -> String {
    unescape(s).value
}

/// Split a dotted name into its segments.
///
/// Double-quoted segments may contain dots and lose their quotes;
/// whitespace around segments is dropped.
pub fn split_qualified_identifier(s: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '.' if !in_quotes => {
                segments.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    segments.push(current.trim().to_string());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip() {
        let samples = [
            "plain",
            "it's",
            "say \"hi\"",
            "back\\slash",
            "line\nbreak\ttab\rcr",
            "\u{8}\u{c}\u{b}\0",
            "mixed '\\' \"\n\" end",
            "",
        ];
        for sample in samples {
            assert_eq!(unescape_string(&escape_string(sample)), sample, "{sample:?}");
        }
    }

    #[test]
    fn test_escape_output() {
        assert_eq!(escape_string("a'b\n"), "a\\'b\\n");
    }

    #[test]
    fn test_unescape_unicode() {
        assert_eq!(unescape_string("\\u0041bc"), "Abc");
    }

    #[test]
    fn test_unescape_unknown_escape_keeps_char() {
        assert_eq!(unescape_string("\\q"), "q");
    }

    #[test]
    fn test_unescape_invalid_unicode() {
        let result = unescape("x\\u12z");
        assert_eq!(result.value, "x\\u12z");
        assert_eq!(result.invalid, vec![1..3]);
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split_qualified_identifier("schema.table"), ["schema", "table"]);
        assert_eq!(split_qualified_identifier("users"), ["users"]);
    }

    #[test]
    fn test_split_quoted_segment_keeps_dots() {
        assert_eq!(split_qualified_identifier("\"a.b\".c"), ["a.b", "c"]);
        assert_eq!(
            split_qualified_identifier("s . \"t x\" . col"),
            ["s", "t x", "col"]
        );
    }
}
