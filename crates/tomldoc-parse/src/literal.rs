//! Literal classification and string unescaping.

use std::borrow::Cow;

use crate::ValueKind;

/// Decide which literal category a bare value belongs to.
///
/// This only looks at the shape of the text; whether the literal is actually
/// well formed is left to the decoders. Returns `None` for text that cannot
/// be any literal (e.g. `hello`).
pub fn classify_literal(text: &str) -> Option<ValueKind> {
    match text {
        "true" | "false" => return Some(ValueKind::Boolean),
        "inf" | "+inf" | "-inf" | "nan" | "+nan" | "-nan" => return Some(ValueKind::Float),
        _ => {}
    }

    let bytes = text.as_bytes();
    // full-date [time-delim partial-time [time-offset]]
    if bytes.len() >= 5 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-' {
        if bytes.len() <= 10 {
            return Some(ValueKind::LocalDate);
        }
        let time = &text[11.min(text.len())..];
        return Some(if has_time_offset(time) {
            ValueKind::OffsetDateTime
        } else {
            ValueKind::LocalDateTime
        });
    }

    // partial-time
    if looks_like_time(text) {
        return Some(ValueKind::LocalTime);
    }

    // Signs on prefixed integers are left for the decoder to reject.
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned.len() > 2 && ["0x", "0o", "0b"].iter().any(|p| unsigned.starts_with(p)) {
        return Some(ValueKind::Integer);
    }
    if !unsigned.starts_with(|c: char| c.is_ascii_digit()) && !unsigned.starts_with('.') {
        return None;
    }
    if unsigned
        .bytes()
        .any(|b| !(b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'e' | b'E' | b'+' | b'-')))
    {
        return None;
    }
    if unsigned.contains(['.', 'e', 'E']) {
        Some(ValueKind::Float)
    } else {
        Some(ValueKind::Integer)
    }
}

/// Whether the time part of a date-time carries a zone.
fn has_time_offset(time: &str) -> bool {
    time.ends_with('Z') || time.contains(['+', '-'])
}

/// Whether `text` looks like the start of a partial-time (`HH:`).
pub(crate) fn looks_like_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 3 && bytes[..2].iter().all(u8::is_ascii_digit) && bytes[2] == b':'
}

/// An invalid escape sequence at a byte offset into the unescaped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EscapeError {
    pub offset: usize,
    pub sequence: String,
}

/// Process the escapes of a basic string body.
///
/// In multi-line strings a backslash at the end of a line removes the line
/// break and all whitespace (including further line breaks) up to the next
/// non-whitespace character.
pub(crate) fn unescape_basic(text: &str, multiline: bool) -> Result<Cow<'_, str>, EscapeError> {
    if !text.contains('\\') {
        return Ok(Cow::Borrowed(text));
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some((_, 'b')) => result.push('\u{8}'),
            Some((_, 't')) => result.push('\t'),
            Some((_, 'n')) => result.push('\n'),
            Some((_, 'f')) => result.push('\u{c}'),
            Some((_, 'r')) => result.push('\r'),
            Some((_, '"')) => result.push('"'),
            Some((_, '\\')) => result.push('\\'),
            Some((_, 'u')) => result.push(unicode_escape(text, i, 4)?),
            Some((_, 'U')) => result.push(unicode_escape(text, i, 8)?),
            Some((_, c)) if multiline && matches!(c, ' ' | '\t' | '\r' | '\n') => {
                let mut saw_newline = c == '\n';
                while let Some(&(_, next)) = chars.peek() {
                    match next {
                        ' ' | '\t' | '\r' => {}
                        '\n' => saw_newline = true,
                        _ => break,
                    }
                    chars.next();
                }
                if !saw_newline {
                    return Err(EscapeError {
                        offset: i,
                        sequence: format!("\\{c}"),
                    });
                }
            }
            Some((_, c)) => {
                return Err(EscapeError {
                    offset: i,
                    sequence: format!("\\{c}"),
                });
            }
            None => {
                return Err(EscapeError {
                    offset: i,
                    sequence: "\\".to_string(),
                });
            }
        }
        // Skip over the hex digits consumed by a unicode escape.
        if let Some(len) = unicode_escape_len(text, i) {
            for _ in 0..len {
                chars.next();
            }
        }
    }

    Ok(Cow::Owned(result))
}

/// Number of hex digits following `\u` / `\U` at `backslash`, if that is
/// what sits there.
fn unicode_escape_len(text: &str, backslash: usize) -> Option<usize> {
    match text.as_bytes().get(backslash + 1) {
        Some(b'u') => Some(4),
        Some(b'U') => Some(8),
        _ => None,
    }
}

/// Decode the `digits` hex digits following `\u` or `\U` at `backslash`.
fn unicode_escape(text: &str, backslash: usize, digits: usize) -> Result<char, EscapeError> {
    let start = backslash + 2;
    let hex = text
        .get(start..start + digits)
        .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()));
    // The sequence ends after `digits` chars, which need not be ASCII.
    let end = text[start..]
        .char_indices()
        .nth(digits)
        .map_or(text.len(), |(i, _)| start + i);
    let invalid = || EscapeError {
        offset: backslash,
        sequence: text[backslash..end].to_string(),
    };
    let hex = hex.ok_or_else(invalid)?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(invalid)
}

/// Strip the newline that may immediately follow the opening delimiter of a
/// multi-line string. Returns the remaining body and how many bytes were
/// removed.
pub(crate) fn trim_leading_newline(body: &str) -> (&str, usize) {
    if let Some(rest) = body.strip_prefix('\n') {
        (rest, 1)
    } else if let Some(rest) = body.strip_prefix("\r\n") {
        (rest, 2)
    } else {
        (body, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_classify_numbers() {
        assert_eq!(classify_literal("42"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("-17"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("1_000"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("0xDEAD_beef"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("0o755"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("0b1101"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("-0x1F"), Some(ValueKind::Integer));
        assert_eq!(classify_literal("3.14"), Some(ValueKind::Float));
        assert_eq!(classify_literal("5e+22"), Some(ValueKind::Float));
        assert_eq!(classify_literal("-nan"), Some(ValueKind::Float));
        assert_eq!(classify_literal("+inf"), Some(ValueKind::Float));
        // Malformed floats still classify; the decoder rejects them.
        assert_eq!(classify_literal(".5"), Some(ValueKind::Float));
        assert_eq!(classify_literal("5."), Some(ValueKind::Float));
    }

    #[test]
    fn test_classify_date_times() {
        assert_eq!(classify_literal("1979-05-27"), Some(ValueKind::LocalDate));
        assert_eq!(classify_literal("07:32:00"), Some(ValueKind::LocalTime));
        assert_eq!(
            classify_literal("1979-05-27T07:32:00"),
            Some(ValueKind::LocalDateTime)
        );
        assert_eq!(
            classify_literal("1979-05-27 07:32:00.999"),
            Some(ValueKind::LocalDateTime)
        );
        assert_eq!(
            classify_literal("1979-05-27T07:32:00Z"),
            Some(ValueKind::OffsetDateTime)
        );
        assert_eq!(
            classify_literal("1979-05-27T00:32:00.999999-07:00"),
            Some(ValueKind::OffsetDateTime)
        );
    }

    #[test]
    fn test_classify_rejects_words() {
        assert_eq!(classify_literal("true"), Some(ValueKind::Boolean));
        assert_eq!(classify_literal("hello"), None);
        assert_eq!(classify_literal("True"), None);
        assert_eq!(classify_literal("infinity"), None);
        assert_eq!(classify_literal("12abc"), None);
    }

    #[test]
    fn test_unescape_basic() {
        assert_eq!(unescape_basic("plain", false).unwrap(), "plain");
        assert!(matches!(
            unescape_basic("plain", false).unwrap(),
            Cow::Borrowed(_)
        ));
        assert_eq!(
            unescape_basic(r#"tab\there \"quoted\" \\"#, false).unwrap(),
            "tab\there \"quoted\" \\"
        );
        assert_eq!(unescape_basic(r"é\U0001F600", false).unwrap(), "é😀");
    }

    #[test]
    fn test_unescape_invalid() {
        assert_eq!(
            unescape_basic(r"bad \q", false),
            Err(EscapeError {
                offset: 4,
                sequence: r"\q".to_string()
            })
        );
        assert_eq!(
            unescape_basic(r"\u12", false),
            Err(EscapeError {
                offset: 0,
                sequence: r"\u12".to_string()
            })
        );
        // Surrogates are not scalar values.
        assert!(unescape_basic(r"\uD800", false).is_err());
    }

    #[test]
    fn test_unescape_invalid_before_multibyte_char() {
        assert_eq!(
            unescape_basic("\\u123é", false),
            Err(EscapeError {
                offset: 0,
                sequence: "\\u123é".to_string()
            })
        );
        assert_eq!(
            unescape_basic("x\\U1é2345678", false),
            Err(EscapeError {
                offset: 1,
                sequence: "\\U1é234567".to_string()
            })
        );
        assert!(unescape_basic("\\uéé", false).is_err());
    }

    #[test]
    fn test_line_ending_backslash() {
        assert_eq!(
            unescape_basic("The quick \\\n\n    brown fox", true).unwrap(),
            "The quick brown fox"
        );
        assert_eq!(
            unescape_basic("trailing \\   \r\n  space", true).unwrap(),
            "trailing space"
        );
        // Only valid before a line break, and only in multi-line strings.
        assert!(unescape_basic("a \\ b", true).is_err());
        assert!(unescape_basic("a \\\nb", false).is_err());
    }
}
