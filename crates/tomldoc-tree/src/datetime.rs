//! Local and offset date-time values.
//!
//! Values are lexical: decoding checks the layout of the literal, not the
//! calendar. `1979-02-31` decodes fine; [`LocalDate::is_valid`] and the
//! `chrono` conversions tell whether it denotes a real day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::decode::{
    DecodeError, decode_local_date, decode_local_date_time, decode_local_time,
    decode_offset_date_time,
};

const SECONDS_PER_DAY: i32 = 24 * 3600;

/// A calendar day in no specific timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct LocalDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl LocalDate {
    /// Create a local date.
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Whether this is an existing day of the proleptic Gregorian calendar.
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && (1..=days_in_month(self.year, self.month)).contains(&self.day)
    }

    /// Convert to a `chrono` date. `None` if the date does not exist.
    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        _ => 0,
    }
}

/// A time of day in no specific timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanosecond: u32,
}

impl LocalTime {
    /// Create a local time.
    pub fn new(hour: u8, minute: u8, second: u8, nanosecond: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            nanosecond,
        }
    }

    /// Whether every field is in range. A leap second (`60`) is accepted.
    pub fn is_valid(&self) -> bool {
        self.hour < 24
            && self.minute < 60
            && self.second <= 60
            && self.nanosecond < 1_000_000_000
    }

    /// Convert to a `chrono` time. `None` if a field is out of range.
    ///
    /// A leap second is represented the way `chrono` does, as second 59
    /// with a nanosecond count of one second or more.
    pub fn to_naive(&self) -> Option<NaiveTime> {
        let (second, nano) = if self.second == 60 {
            (59, self.nanosecond.checked_add(1_000_000_000)?)
        } else {
            (u32::from(self.second), self.nanosecond)
        };
        NaiveTime::from_hms_nano_opt(self.hour.into(), self.minute.into(), second, nano)
    }
}

/// A date and time in no specific timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct LocalDateTime {
    pub date: LocalDate,
    pub time: LocalTime,
}

impl LocalDateTime {
    /// Create a local date-time.
    pub fn new(date: LocalDate, time: LocalTime) -> Self {
        Self { date, time }
    }

    /// Whether both the date and the time are valid.
    pub fn is_valid(&self) -> bool {
        self.date.is_valid() && self.time.is_valid()
    }

    /// Convert to a `chrono` date-time.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::new(self.date.to_naive()?, self.time.to_naive()?))
    }
}

/// A timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Offset {
    /// `Z`
    #[default]
    Utc,
    /// `+HH:MM` / `-HH:MM`, in seconds east of UTC.
    Fixed(i32),
}

impl Offset {
    /// Offset from UTC in seconds.
    pub fn seconds(&self) -> i32 {
        match self {
            Offset::Utc => 0,
            Offset::Fixed(seconds) => *seconds,
        }
    }

    /// Whether the offset is strictly within a day of UTC.
    pub fn is_valid(&self) -> bool {
        self.seconds().abs() < SECONDS_PER_DAY
    }
}

/// A date and time at a fixed offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct OffsetDateTime {
    pub date_time: LocalDateTime,
    pub offset: Offset,
}

impl OffsetDateTime {
    /// Create an offset date-time.
    pub fn new(date_time: LocalDateTime, offset: Offset) -> Self {
        Self { date_time, offset }
    }

    /// Whether the date, the time and the offset are valid.
    pub fn is_valid(&self) -> bool {
        self.date_time.is_valid() && self.offset.is_valid()
    }

    /// Convert to a `chrono` date-time at the recorded offset.
    pub fn to_chrono(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset.seconds())?;
        self.date_time
            .to_naive()?
            .and_local_timezone(offset)
            .single()
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.nanosecond != 0 {
            write!(f, ".{:09}", self.nanosecond)?;
        }
        Ok(())
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Utc => f.write_str("Z"),
            Offset::Fixed(seconds) => {
                let sign = if *seconds < 0 { '-' } else { '+' };
                let minutes = seconds.unsigned_abs() / 60;
                write!(f, "{sign}{:02}:{:02}", minutes / 60, minutes % 60)
            }
        }
    }
}

impl fmt::Display for OffsetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.date_time, self.offset)
    }
}

impl FromStr for LocalDate {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_local_date(s)
    }
}

impl FromStr for LocalTime {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (time, rest) = decode_local_time(s)?;
        no_extra_characters(s, rest)?;
        Ok(time)
    }
}

impl FromStr for LocalDateTime {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_time, rest) = decode_local_date_time(s)?;
        no_extra_characters(s, rest)?;
        Ok(date_time)
    }
}

impl FromStr for OffsetDateTime {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_offset_date_time(s)
    }
}

fn no_extra_characters(text: &str, rest: &str) -> Result<(), DecodeError> {
    if rest.is_empty() {
        Ok(())
    } else {
        let start = text.len() - rest.len();
        Err(DecodeError::new(start..text.len(), "extra characters"))
    }
}
