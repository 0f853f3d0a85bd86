//! Decoders for numeric and date-time literals.
//!
//! Each decoder takes the raw text of one literal and either returns the
//! typed value or a [`DecodeError`] whose span is relative to the start of
//! that text. Use [`DecodeError::offset_by`] to place it in the document.

use std::borrow::Cow;
use std::ops::Range;

use tomldoc_parse::Span;

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, Offset, OffsetDateTime};

/// A malformed numeric or date-time literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DecodeError {
    /// The offending bytes.
    pub span: Span,
    /// What is wrong with them.
    pub message: String,
}

impl DecodeError {
    /// Create a decode error covering `range` of the literal.
    pub fn new(range: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span: Span::new(range.start as u32, range.end as u32),
            message: message.into(),
        }
    }

    /// Shift the span by `base` bytes.
    pub fn offset_by(self, base: u32) -> Self {
        Self {
            span: self.span.offset_by(base),
            message: self.message,
        }
    }
}

/// Decode an integer: decimal, or hexadecimal, octal or binary with a `0x`,
/// `0o` or `0b` prefix.
pub fn decode_integer(text: &str) -> Result<i64, DecodeError> {
    let whole = 0..text.len();
    let bytes = text.as_bytes();

    if bytes.len() > 2 && bytes[0] == b'0' {
        let (radix, name) = match bytes[1] {
            b'x' => (16, "hexadecimal"),
            b'o' => (8, "octal"),
            b'b' => (2, "binary"),
            _ => return decode_decimal(text),
        };
        let cleaned = remove_underscores(&text[2..], 2, radix == 16)?;
        if let Some(bad) = cleaned.chars().find(|c| !c.is_digit(radix)) {
            return Err(DecodeError::new(
                whole,
                format!("couldn't parse {name} number: invalid digit '{bad}'"),
            ));
        }
        return i64::from_str_radix(&cleaned, radix)
            .map_err(|err| DecodeError::new(whole, format!("couldn't parse {name} number: {err}")));
    }

    if let Some(unsigned) = text.strip_prefix(['+', '-'])
        && ["0x", "0o", "0b"].iter().any(|p| unsigned.starts_with(p))
    {
        return Err(DecodeError::new(
            whole,
            "integers with a base prefix cannot have a sign",
        ));
    }

    decode_decimal(text)
}

fn decode_decimal(text: &str) -> Result<i64, DecodeError> {
    let whole = 0..text.len();
    let cleaned = remove_underscores(text, 0, false)?;
    let unsigned = cleaned.strip_prefix(['+', '-']).unwrap_or(&cleaned);
    if unsigned.len() > 1 && unsigned.starts_with('0') {
        return Err(DecodeError::new(
            whole,
            "decimal integers cannot have leading zeros",
        ));
    }
    cleaned
        .parse::<i64>()
        .map_err(|err| DecodeError::new(whole, format!("couldn't parse decimal number: {err}")))
}

/// Decode a float, including `inf` and `nan` with an optional sign.
pub fn decode_float(text: &str) -> Result<f64, DecodeError> {
    match text {
        "nan" | "+nan" => return Ok(f64::NAN),
        "-nan" => return Ok(-f64::NAN),
        "inf" | "+inf" => return Ok(f64::INFINITY),
        "-inf" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }

    let whole = 0..text.len();
    let cleaned = remove_underscores(text, 0, false)?;
    let unsigned = cleaned.strip_prefix(['+', '-']).unwrap_or(&cleaned);

    if unsigned.starts_with('.') {
        return Err(DecodeError::new(whole, "float cannot start with a dot"));
    }
    if unsigned.ends_with('.') {
        return Err(DecodeError::new(whole, "float cannot end with a dot"));
    }
    if unsigned.contains(".e") || unsigned.contains(".E") {
        return Err(DecodeError::new(
            whole,
            "decimal point must be followed by a digit",
        ));
    }
    let integer_part = unsigned
        .split(['.', 'e', 'E'])
        .next()
        .unwrap_or(unsigned);
    if integer_part.len() > 1 && integer_part.starts_with('0') {
        return Err(DecodeError::new(whole, "float cannot have leading zeros"));
    }
    // Rust's float parser also accepts words like `infinity`.
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return Err(DecodeError::new(
            whole,
            "unable to parse float: invalid float literal",
        ));
    }

    cleaned
        .parse::<f64>()
        .map_err(|err| DecodeError::new(whole, format!("unable to parse float: {err}")))
}

/// Check underscore placement and strip the underscores.
///
/// Every underscore must sit between two digits (hex digits when `hex`).
/// `base` is the position of `text` within the literal, for error spans.
fn remove_underscores(text: &str, base: usize, hex: bool) -> Result<Cow<'_, str>, DecodeError> {
    let bytes = text.as_bytes();
    let is_digit = |b: u8| {
        if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        }
    };

    match (bytes.first(), bytes.last()) {
        (None, _) => return Err(DecodeError::new(base..base, "number cannot be empty")),
        (Some(b'_'), _) => {
            return Err(DecodeError::new(
                base..base + 1,
                "number cannot start with underscore",
            ));
        }
        (_, Some(b'_')) => {
            let end = base + bytes.len();
            return Err(DecodeError::new(
                end - 1..end,
                "number cannot end with underscore",
            ));
        }
        _ => {}
    }

    if !text.contains('_') {
        return Ok(Cow::Borrowed(text));
    }

    let mut cleaned = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c != '_' {
            cleaned.push(c);
            continue;
        }
        // Neither end is an underscore, so both neighbors exist.
        let (before, after) = (bytes[i - 1], bytes[i + 1]);
        if before == b'_' {
            return Err(DecodeError::new(
                base + i - 1..base + i + 1,
                "number must have at least one digit between underscores",
            ));
        }
        if !is_digit(before) || (!is_digit(after) && after != b'_') {
            return Err(DecodeError::new(
                base + i..base + i + 1,
                "underscores must be surrounded by digits",
            ));
        }
    }
    Ok(Cow::Owned(cleaned))
}

/// Decode a `YYYY-MM-DD` date. The calendar is not checked.
pub fn decode_local_date(text: &str) -> Result<LocalDate, DecodeError> {
    let b = text.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return Err(DecodeError::new(
            0..text.len(),
            "dates are expected to have the format YYYY-MM-DD",
        ));
    }

    Ok(LocalDate {
        year: decimal_digits(b, 0..4)? as u16,
        month: decimal_digits(b, 5..7)? as u8,
        day: decimal_digits(b, 8..10)? as u8,
    })
}

/// Decode a `HH:MM:SS[.fraction]` time.
///
/// Returns the time and whatever follows it, so that an offset can be
/// decoded from the rest.
pub fn decode_local_time(text: &str) -> Result<(LocalTime, &str), DecodeError> {
    const FRACTION_START: usize = 9;
    const MAX_FRACTION_DIGITS: usize = 9;

    let b = text.as_bytes();
    if b.len() < 8 {
        return Err(DecodeError::new(
            0..text.len(),
            "times are expected to have the format HH:MM:SS[.NNNNNN]",
        ));
    }

    let hour = decimal_digits(b, 0..2)? as u8;
    if b[2] != b':' {
        return Err(DecodeError::new(
            2..3,
            "expecting colon between hours and minutes",
        ));
    }
    let minute = decimal_digits(b, 3..5)? as u8;
    if b[5] != b':' {
        return Err(DecodeError::new(
            5..6,
            "expecting colon between minutes and seconds",
        ));
    }
    let second = decimal_digits(b, 6..8)? as u8;

    let mut time = LocalTime {
        hour,
        minute,
        second,
        nanosecond: 0,
    };

    if b.get(8) != Some(&b'.') {
        return Ok((time, &text[8..]));
    }

    let digits = b[FRACTION_START..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return Err(DecodeError::new(
            8..9,
            "need at least one digit after fraction point",
        ));
    }
    if digits > MAX_FRACTION_DIGITS {
        let extra = FRACTION_START + MAX_FRACTION_DIGITS;
        return Err(DecodeError::new(
            extra..extra + 1,
            "maximum precision for date time is nanosecond",
        ));
    }

    let fraction = decimal_digits(b, FRACTION_START..FRACTION_START + digits)?;
    time.nanosecond = fraction * 10u32.pow((MAX_FRACTION_DIGITS - digits) as u32);
    Ok((time, &text[FRACTION_START + digits..]))
}

/// Decode a date and a time separated by `T` or a space.
///
/// Like [`decode_local_time`], returns whatever follows the time.
pub fn decode_local_date_time(text: &str) -> Result<(LocalDateTime, &str), DecodeError> {
    let format_error = || {
        DecodeError::new(
            0..text.len(),
            "local datetimes are expected to have the format YYYY-MM-DDTHH:MM:SS[.NNNNNNNNN]",
        )
    };
    if text.len() < 11 {
        return Err(format_error());
    }

    let date = decode_local_date(text.get(..10).ok_or_else(format_error)?)?;
    if !matches!(text.as_bytes()[10], b'T' | b' ') {
        return Err(DecodeError::new(
            10..11,
            "datetime separator is expected to be T or a space",
        ));
    }
    let (time, rest) = decode_local_time(&text[11..]).map_err(|err| err.offset_by(11))?;

    Ok((LocalDateTime { date, time }, rest))
}

/// Decode a date-time followed by `Z` or a `±HH:MM` offset.
pub fn decode_offset_date_time(text: &str) -> Result<OffsetDateTime, DecodeError> {
    const NUMERIC_OFFSET_LEN: usize = 6;

    let (date_time, rest) = decode_local_date_time(text)?;
    let zone_start = text.len() - rest.len();
    let zone = rest.as_bytes();

    let (offset, used) = match zone.first() {
        None => {
            return Err(DecodeError::new(
                zone_start..zone_start,
                "date time should have a timezone",
            ));
        }
        Some(b'Z') => (Offset::Utc, 1),
        Some(sign @ (b'+' | b'-')) if zone.len() == NUMERIC_OFFSET_LEN && zone[3] == b':' => {
            let hours = decimal_digits(zone, 1..3).map_err(|err| err.offset_by(zone_start as u32))?;
            let minutes =
                decimal_digits(zone, 4..6).map_err(|err| err.offset_by(zone_start as u32))?;
            let seconds = (hours * 3600 + minutes * 60) as i32;
            let seconds = if *sign == b'-' { -seconds } else { seconds };
            (Offset::Fixed(seconds), NUMERIC_OFFSET_LEN)
        }
        Some(_) => {
            return Err(DecodeError::new(
                zone_start..text.len(),
                "invalid date-time timezone",
            ));
        }
    };

    if rest.len() > used {
        return Err(DecodeError::new(
            zone_start + used..text.len(),
            "extra bytes at the end of the timezone",
        ));
    }

    Ok(OffsetDateTime { date_time, offset })
}

/// Accumulate the ASCII digits of `bytes[range]`.
fn decimal_digits(bytes: &[u8], range: Range<usize>) -> Result<u32, DecodeError> {
    let mut value = 0u32;
    for i in range {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return Err(DecodeError::new(i..i + 1, "expected a digit"));
        }
        value = value * 10 + u32::from(b - b'0');
    }
    Ok(value)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Insert `_` between digit groups of three, counted from the right.
    fn group_digits(digits: &str) -> String {
        let mut out = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push('_');
            }
            out.push(c);
        }
        out
    }

    proptest! {
        #[test]
        fn decimal_round_trips(value in any::<i64>()) {
            let text = value.to_string();
            prop_assert_eq!(decode_integer(&text), Ok(value));
        }

        #[test]
        fn grouped_decimal_round_trips(value in any::<i64>()) {
            let digits = value.unsigned_abs().to_string();
            let sign = if value < 0 { "-" } else { "" };
            let text = format!("{sign}{}", group_digits(&digits));
            let decoded = decode_integer(&text);
            prop_assert_eq!(decoded.clone(), Ok(value));
            prop_assert_eq!(decoded.map(|v| v.to_string()), Ok(value.to_string()));
        }

        #[test]
        fn hex_round_trips(value in 0..=i64::MAX) {
            let text = format!("0x{value:x}");
            prop_assert_eq!(decode_integer(&text), Ok(value));
        }

        #[test]
        fn times_round_trip(
            hour in 0u8..24,
            minute in 0u8..60,
            second in 0u8..60,
            nanosecond in 0u32..1_000_000_000,
        ) {
            let time = LocalTime::new(hour, minute, second, nanosecond);
            let text = time.to_string();
            let (decoded, rest) = decode_local_time(&text).unwrap();
            prop_assert_eq!(decoded, time);
            prop_assert_eq!(rest, "");
        }
    }
}
