//! Weekly schedule time.
//!
//! Services repeat every week, so every schedule instant is a single linear
//! minute offset inside a Monday-first 7-day week.

use std::fmt;

use chrono::{Datelike, Timelike};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

use crate::models::types::{Result, TransitError};

pub const MINUTES_PER_HOUR: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;
pub const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

/// Day labels as they appear in the schedule, Monday first.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    FromRepr,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DayOfWeek {
    Lu = 0,
    Ma = 1,
    Me = 2,
    Je = 3,
    Ve = 4,
    Sa = 5,
    Di = 6,
}

// Indexed by a Sunday-first day number (0 = Sunday).
const SUNDAY_FIRST: [DayOfWeek; 7] = [
    DayOfWeek::Di,
    DayOfWeek::Lu,
    DayOfWeek::Ma,
    DayOfWeek::Me,
    DayOfWeek::Je,
    DayOfWeek::Ve,
    DayOfWeek::Sa,
];

impl DayOfWeek {
    /// Parse a schedule day label (`Lu`, `Ma`, ... `Di`).
    pub fn parse(label: &str) -> Result<Self> {
        label
            .trim()
            .parse()
            .map_err(|_| TransitError::Parse(format!("unknown day label {label:?}")))
    }

    /// Monday-first index in `0..7`.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }

    /// Map a Sunday-first day number (0 = Sunday .. 6 = Saturday) onto the
    /// Monday-first label set.
    pub fn from_days_from_sunday(days: u32) -> Self {
        SUNDAY_FIRST[(days % 7) as usize]
    }

    pub fn next(self) -> Self {
        Self::from_week_index((self.index() + 1) % 7)
    }

    fn from_week_index(index: u32) -> Self {
        Self::from_index(index % 7).unwrap_or(Self::Lu)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A minute inside the repeating week, always in `0..MINUTES_PER_WEEK`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WeekMinute(u32);

impl WeekMinute {
    /// Wraps any minute count onto the week.
    pub fn new(minutes: u32) -> Self {
        Self(minutes % MINUTES_PER_WEEK)
    }

    pub fn from_day_minute(day: DayOfWeek, minute_of_day: u32) -> Self {
        Self::new(day.index() * MINUTES_PER_DAY + minute_of_day % MINUTES_PER_DAY)
    }

    /// Week position of a local wall-clock instant.
    pub fn from_datetime<T: Datelike + Timelike>(now: &T) -> Self {
        Self::from_day_minute(current_day(now), current_time_minutes(now))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn day(self) -> DayOfWeek {
        DayOfWeek::from_week_index(self.0 / MINUTES_PER_DAY)
    }

    pub fn minute_of_day(self) -> u32 {
        self.0 % MINUTES_PER_DAY
    }

    /// Move forward, wrapping Sunday 23:59 onto Monday 00:00.
    pub fn advance(self, minutes: u32) -> Self {
        Self::new(self.0 + minutes % MINUTES_PER_WEEK)
    }
}

impl fmt::Display for WeekMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day(), format_time_of_day(self.minute_of_day()))
    }
}

/// `dayIndex * 1440 + hours * 60 + minutes` for a schedule day and `HH:MM` time.
pub fn day_time_to_minutes(day: DayOfWeek, time: &str) -> Result<WeekMinute> {
    let minute_of_day = parse_time_of_day(time)?;
    Ok(WeekMinute::from_day_minute(day, minute_of_day))
}

/// Parse `HH:MM` (or `HH:MM:SS`, seconds ignored) into minutes since midnight.
pub fn parse_time_of_day(time: &str) -> Result<u32> {
    let malformed = || TransitError::Parse(format!("malformed time {time:?}, expected HH:MM"));

    let mut parts = time.trim().split(':');
    let hours = parts.next().and_then(parse_field).ok_or_else(malformed)?;
    let minutes = parts.next().and_then(parse_field).ok_or_else(malformed)?;

    if let Some(seconds) = parts.next() {
        parse_field(seconds).filter(|s| *s < 60).ok_or_else(malformed)?;
    }
    if parts.next().is_some() || hours >= 24 || minutes >= MINUTES_PER_HOUR {
        return Err(malformed());
    }

    Ok(hours * MINUTES_PER_HOUR + minutes)
}

fn parse_field(field: &str) -> Option<u32> {
    let digits = (1..=2).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit());
    digits.then(|| field.parse().ok()).flatten()
}

pub fn format_time_of_day(minute_of_day: u32) -> String {
    let minute_of_day = minute_of_day % MINUTES_PER_DAY;
    format!(
        "{:02}:{:02}",
        minute_of_day / MINUTES_PER_HOUR,
        minute_of_day % MINUTES_PER_HOUR
    )
}

/// Schedule day of a local wall-clock instant.
pub fn current_day<T: Datelike>(now: &T) -> DayOfWeek {
    DayOfWeek::from_days_from_sunday(now.weekday().num_days_from_sunday())
}

/// Minutes since local midnight.
pub fn current_time_minutes<T: Timelike>(now: &T) -> u32 {
    now.hour() * MINUTES_PER_HOUR + now.minute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use strum::IntoEnumIterator;

    #[test]
    fn test_day_time_to_minutes() {
        let wednesday = day_time_to_minutes(DayOfWeek::Me, "08:30").unwrap();
        assert_eq!(wednesday.get(), 3390);

        assert_eq!(day_time_to_minutes(DayOfWeek::Lu, "00:00").unwrap().get(), 0);
        assert_eq!(
            day_time_to_minutes(DayOfWeek::Di, "23:59").unwrap().get(),
            MINUTES_PER_WEEK - 1
        );
    }

    #[test]
    fn test_seconds_are_ignored() {
        let minutes = day_time_to_minutes(DayOfWeek::Ve, "17:05:42").unwrap();
        assert_eq!(minutes.get(), 4 * 1440 + 17 * 60 + 5);
    }

    #[test]
    fn test_malformed_times_are_rejected() {
        for bad in ["", "8", "08:", ":30", "ab:cd", "24:00", "12:60", "1:2:3:4", "+1:30", "08h30"] {
            assert!(
                matches!(parse_time_of_day(bad), Err(TransitError::Parse(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_round_trip() {
        for day in DayOfWeek::iter() {
            for time in ["00:00", "06:15", "12:00", "23:59"] {
                let minutes = day_time_to_minutes(day, time).unwrap();
                assert_eq!(minutes.day(), day);
                assert_eq!(format_time_of_day(minutes.minute_of_day()), time);
            }
        }
    }

    #[test]
    fn test_day_labels() {
        assert_eq!(DayOfWeek::parse("Me").unwrap(), DayOfWeek::Me);
        assert_eq!(DayOfWeek::parse(" Di ").unwrap(), DayOfWeek::Di);
        assert!(DayOfWeek::parse("Mo").is_err());
        assert_eq!(DayOfWeek::Sa.to_string(), "Sa");
        assert_eq!(DayOfWeek::Di.next(), DayOfWeek::Lu);
    }

    #[test]
    fn test_sunday_first_remap() {
        assert_eq!(DayOfWeek::from_days_from_sunday(0), DayOfWeek::Di);
        assert_eq!(DayOfWeek::from_days_from_sunday(1), DayOfWeek::Lu);
        assert_eq!(DayOfWeek::from_days_from_sunday(6), DayOfWeek::Sa);

        // 2024-06-02 was a Sunday, 2024-06-03 a Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(current_day(&sunday), DayOfWeek::Di);
        assert_eq!(current_day(&monday), DayOfWeek::Lu);
    }

    #[test]
    fn test_from_datetime() {
        let thursday_evening = NaiveDate::from_ymd_opt(2024, 6, 6)
            .unwrap()
            .and_hms_opt(19, 45, 10)
            .unwrap();

        let minute = WeekMinute::from_datetime(&thursday_evening);
        assert_eq!(minute.day(), DayOfWeek::Je);
        assert_eq!(minute.minute_of_day(), 19 * 60 + 45);
        assert_eq!(minute.to_string(), "Je 19:45");
    }

    #[test]
    fn test_advance_wraps_week() {
        let last = WeekMinute::from_day_minute(DayOfWeek::Di, 1439);
        let wrapped = last.advance(1);
        assert_eq!(wrapped.get(), 0);
        assert_eq!(wrapped.day(), DayOfWeek::Lu);

        let saturday = WeekMinute::from_day_minute(DayOfWeek::Sa, 1439).advance(1);
        assert_eq!(saturday.day(), DayOfWeek::Di);
        assert_eq!(saturday.minute_of_day(), 0);
    }
}
