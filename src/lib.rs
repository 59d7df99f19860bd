//! Segment-by-segment editing of formatted date/time values.
//!
//! A display format such as `DD.MM.YYYY` is split into typed sections. The
//! user edits one section at a time (typing digits, pressing arrow keys) while
//! the rest of the text stays put. Components the user has not supplied yet
//! are tracked explicitly through [`IncompleteValue`], so intermediate states
//! like "day 31, month unknown" are representable, and a real value is only
//! committed once every required field is filled in and consistent.
//!
//! [`DateFieldState`] drives a single value, [`RangeFieldState`] stitches two
//! of them together around a delimiter. Both implement [`SegmentedField`] and
//! can be hosted by [`DateField`], which owns the update callback.

mod arithmetic;
mod config;
mod consts;
mod field;
mod format;
mod locale;
mod prelude;
mod range;
mod sections;
#[cfg(test)]
mod test_utils;
mod tokenizer;
mod types;

pub use arithmetic::{LetterMatch, TypedValue, step_value, type_digit, type_letter, wrap};
pub use config::{ConfigError, DateParser, FieldConfig, FieldOptions, UnavailablePredicate};
pub use consts::*;
pub use field::{
    DateField, DateFieldState, FieldEvent, FieldUpdate, Key, SegmentedField, Selection,
    Transition,
};
pub use format::{format_date, parse_date, parse_iso, resolve_local, to_iso};
pub use locale::{EN, Locale, NameWidth, Placeholders, RU};
pub use range::{DateRange, RangeError, RangeFieldState};
pub use sections::{EditableSection, link_sections, materialize, sections_text, stitch};
pub use tokenizer::{Section, TokenStyle, expand_long_formats, required_fields, tokenize};
pub use types::{ContentType, FieldKind, FieldSet, SectionKind, days_in_month, is_leap_year};

use crate::prelude::*;
use serde::{Deserialize, Serialize};

/// A date where some components are still unknown.
///
/// Every component is optional. Operations never mutate in place; they return
/// a new value, so two states can be compared cheaply to detect an edit.
/// Setting the hour keeps `day_period` consistent with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteValue {
    year: Option<i32>,
    month: Option<i32>,
    day: Option<i32>,
    /// 0 = Sunday
    weekday: Option<i32>,
    /// Always 24-hour
    hour: Option<i32>,
    minute: Option<i32>,
    second: Option<i32>,
    /// [`AM`] or [`PM`]
    day_period: Option<i32>,
}

/// Which halves of a date/time [`IncompleteValue::to_date`] overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateParts {
    pub date: bool,
    pub time: bool,
}

impl DateParts {
    pub const ALL: Self = Self {
        date: true,
        time: true,
    };
    pub const DATE: Self = Self {
        date: true,
        time: false,
    };
    pub const TIME: Self = Self {
        date: false,
        time: true,
    };
}

/// Errors produced when text cannot be turned into a date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty date string")]
    EmptyInput,

    #[error("Expected {expected:?} at offset {offset}")]
    LiteralMismatch { expected: String, offset: usize },

    #[error("Invalid {field} value {text:?} at offset {offset}")]
    InvalidField {
        field: FieldKind,
        text: String,
        offset: usize,
    },

    #[error("Unexpected trailing input {0:?}")]
    TrailingInput(String),

    #[error("Date is missing required fields")]
    Incomplete,

    #[error("Date does not exist: {0}")]
    NonexistentDate(String),

    #[error("Invalid ISO 8601 date: {0}")]
    InvalidIso(String),
}

impl IncompleteValue {
    /// An empty value: nothing entered yet.
    pub const fn new() -> Self {
        Self {
            year: None,
            month: None,
            day: None,
            weekday: None,
            hour: None,
            minute: None,
            second: None,
            day_period: None,
        }
    }

    /// Every component taken from a concrete date.
    pub fn from_date(date: &NaiveDateTime) -> Self {
        FieldKind::ALL
            .into_iter()
            .filter(|field| *field != FieldKind::Quarter)
            .fold(Self::new(), |value, field| {
                value.set(field, component(date, field))
            })
    }

    /// Returns the component for `field`. The quarter is derived from the month.
    pub const fn get(&self, field: FieldKind) -> Option<i32> {
        match field {
            FieldKind::Year => self.year,
            FieldKind::Quarter => match self.month {
                Some(month) => Some((month - 1) / MONTHS_PER_QUARTER + 1),
                None => None,
            },
            FieldKind::Month => self.month,
            FieldKind::Weekday => self.weekday,
            FieldKind::Day => self.day,
            FieldKind::DayPeriod => self.day_period,
            FieldKind::Hour => self.hour,
            FieldKind::Minute => self.minute,
            FieldKind::Second => self.second,
        }
    }

    /// Returns a copy with `field` set.
    ///
    /// The quarter writes the month, keeping its in-quarter offset
    /// (`month % 3`, an unset month counting as 0). Writing the quarter the
    /// month is already in leaves it alone. The hour refreshes the day
    /// period; the day period moves an already set hour into its half of the
    /// day.
    #[must_use]
    pub fn set(self, field: FieldKind, value: i32) -> Self {
        let mut next = self;
        match field {
            FieldKind::Year => next.year = Some(value),
            FieldKind::Quarter if self.get(FieldKind::Quarter) == Some(value) => {}
            FieldKind::Quarter => {
                let offset = self.month.unwrap_or(0).rem_euclid(MONTHS_PER_QUARTER);
                next.month = Some(MONTHS_PER_QUARTER * (value - 1) + 1 + offset);
            }
            FieldKind::Month => next.month = Some(value),
            FieldKind::Weekday => next.weekday = Some(value),
            FieldKind::Day => next.day = Some(value),
            FieldKind::DayPeriod => {
                let period = if value >= PM { PM } else { AM };
                next.day_period = Some(period);
                next.hour = self
                    .hour
                    .map(|hour| hour % HOURS_PER_PERIOD + HOURS_PER_PERIOD * period);
            }
            FieldKind::Hour => {
                next.hour = Some(value);
                next.day_period = Some(if value >= HOURS_PER_PERIOD { PM } else { AM });
            }
            FieldKind::Minute => next.minute = Some(value),
            FieldKind::Second => next.second = Some(value),
        }
        next
    }

    /// Returns a copy with `field` unset.
    #[must_use]
    pub const fn clear(self, field: FieldKind) -> Self {
        let mut next = self;
        match field {
            FieldKind::Year => next.year = None,
            FieldKind::Quarter | FieldKind::Month => next.month = None,
            FieldKind::Weekday => next.weekday = None,
            FieldKind::Day => next.day = None,
            FieldKind::DayPeriod => next.day_period = None,
            FieldKind::Hour => next.hour = None,
            FieldKind::Minute => next.minute = None,
            FieldKind::Second => next.second = None,
        }
        next
    }

    /// Returns a copy where `fields` are taken from `other`.
    #[must_use]
    pub fn copy_from(self, other: &Self, fields: FieldSet) -> Self {
        fields.iter().fold(self, |value, field| {
            match other.get(field.storage()) {
                Some(component) => value.with_raw(field.storage(), component),
                None => value.clear(field),
            }
        })
    }

    /// Like [`set`](Self::set) but without the hour/day-period coupling.
    const fn with_raw(self, field: FieldKind, value: i32) -> Self {
        let mut next = self;
        match field {
            FieldKind::Year => next.year = Some(value),
            FieldKind::Quarter | FieldKind::Month => next.month = Some(value),
            FieldKind::Weekday => next.weekday = Some(value),
            FieldKind::Day => next.day = Some(value),
            FieldKind::DayPeriod => next.day_period = Some(value),
            FieldKind::Hour => next.hour = Some(value),
            FieldKind::Minute => next.minute = Some(value),
            FieldKind::Second => next.second = Some(value),
        }
        next
    }

    /// Every required field has a value.
    pub fn is_complete(&self, required: FieldSet) -> bool {
        required.iter().all(|field| self.get(field).is_some())
    }

    /// No required field has a value.
    pub fn is_cleared(&self, required: FieldSet) -> bool {
        required.iter().all(|field| self.get(field).is_none())
    }

    /// Every required field equals the matching component of `date`.
    ///
    /// A materialized date silently rounds impossible entries (day 31 of
    /// April becomes the 30th), which this detects.
    pub fn validate(&self, date: &NaiveDateTime, required: FieldSet) -> bool {
        required
            .iter()
            .all(|field| self.get(field) == Some(component(date, field)))
    }

    /// Overlays the present components onto `base`.
    ///
    /// The month is applied while the day is still pinned to the 1st, so a day
    /// entered before its month cannot overflow into the next month; the day is
    /// then clamped to the month's length. Without a day, a weekday moves the
    /// base day within its week, staying inside the month.
    pub fn to_date(&self, base: NaiveDateTime, parts: DateParts) -> NaiveDateTime {
        let mut date = base.date();
        if parts.date {
            let year = self.year.unwrap_or(base.year()).clamp(MIN_YEAR, MAX_YEAR);
            let month = self
                .month
                .unwrap_or(base.month() as i32)
                .clamp(JANUARY, DECEMBER);
            let month_len = days_in_month(year, month);
            let base_day = (base.day() as i32).min(month_len);

            let day = match (self.day, self.weekday) {
                (Some(day), _) => day.clamp(MIN_DAY, month_len),
                (None, Some(weekday)) => {
                    let current = ymd(year, month, base_day).map_or(weekday, |d| {
                        d.weekday().num_days_from_sunday() as i32
                    });
                    let shifted = base_day + weekday.rem_euclid(DAYS_PER_WEEK) - current;
                    if shifted < MIN_DAY {
                        shifted + DAYS_PER_WEEK
                    } else if shifted > month_len {
                        shifted - DAYS_PER_WEEK
                    } else {
                        shifted
                    }
                }
                (None, None) => base_day,
            };
            date = ymd(year, month, day).unwrap_or(date);
        }

        let mut time = base.time();
        if parts.time {
            let base_hour = base.hour() as i32;
            let hour = match (self.hour, self.day_period) {
                (Some(hour), _) => hour,
                (None, Some(period)) => base_hour % HOURS_PER_PERIOD + HOURS_PER_PERIOD * period,
                (None, None) => base_hour,
            }
            .clamp(0, MAX_HOUR);
            let minute = self
                .minute
                .unwrap_or(base.minute() as i32)
                .clamp(0, MAX_MINUTE);
            let second = self
                .second
                .unwrap_or(base.second() as i32)
                .clamp(0, MAX_SECOND);
            time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)
                .unwrap_or(time);
        }

        date.and_time(time)
    }
}

fn ymd(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Reads the component of a concrete date that `field` describes.
pub fn component(date: &NaiveDateTime, field: FieldKind) -> i32 {
    match field {
        FieldKind::Year => date.year(),
        FieldKind::Quarter => (date.month() as i32 - 1) / MONTHS_PER_QUARTER + 1,
        FieldKind::Month => date.month() as i32,
        FieldKind::Weekday => date.weekday().num_days_from_sunday() as i32,
        FieldKind::Day => date.day() as i32,
        FieldKind::DayPeriod => {
            if date.hour() as i32 >= HOURS_PER_PERIOD {
                PM
            } else {
                AM
            }
        }
        FieldKind::Hour => date.hour() as i32,
        FieldKind::Minute => date.minute() as i32,
        FieldKind::Second => date.second() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::naive;

    fn date_fields() -> FieldSet {
        [FieldKind::Year, FieldKind::Month, FieldKind::Day]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_set_returns_new_value() {
        let empty = IncompleteValue::new();
        let with_day = empty.set(FieldKind::Day, 31);
        assert_eq!(empty.get(FieldKind::Day), None);
        assert_eq!(with_day.get(FieldKind::Day), Some(31));
        assert_ne!(empty, with_day);
    }

    #[test]
    fn test_hour_refreshes_day_period() {
        let value = IncompleteValue::new().set(FieldKind::Hour, 14);
        assert_eq!(value.get(FieldKind::DayPeriod), Some(PM));

        let value = value.set(FieldKind::Hour, 9);
        assert_eq!(value.get(FieldKind::DayPeriod), Some(AM));
    }

    #[test]
    fn test_day_period_moves_hour() {
        let value = IncompleteValue::new()
            .set(FieldKind::Hour, 9)
            .set(FieldKind::DayPeriod, PM);
        assert_eq!(value.get(FieldKind::Hour), Some(21));

        let value = value.set(FieldKind::DayPeriod, AM);
        assert_eq!(value.get(FieldKind::Hour), Some(9));

        // no hour yet: only the period is recorded
        let value = IncompleteValue::new().set(FieldKind::DayPeriod, PM);
        assert_eq!(value.get(FieldKind::Hour), None);
        assert_eq!(value.get(FieldKind::DayPeriod), Some(PM));
    }

    #[test]
    fn test_quarter_with_unset_month() {
        let value = IncompleteValue::new().set(FieldKind::Quarter, 3);
        assert_eq!(value.get(FieldKind::Month), Some(7));
        assert_eq!(value.get(FieldKind::Quarter), Some(3));
    }

    #[test]
    fn test_quarter_keeps_offset() {
        let value = IncompleteValue::new()
            .set(FieldKind::Month, 2)
            .set(FieldKind::Quarter, 3);
        assert_eq!(value.get(FieldKind::Month), Some(9));
        assert_eq!(value.get(FieldKind::Quarter), Some(3));
    }

    #[test]
    fn test_writing_current_quarter_keeps_month() {
        for month in 1..=12 {
            let value = IncompleteValue::new().set(FieldKind::Month, month);
            let quarter = value.get(FieldKind::Quarter).unwrap();
            let rewritten = value.set(FieldKind::Quarter, quarter);
            assert_eq!(rewritten.get(FieldKind::Month), Some(month), "month {month}");
            assert_eq!(rewritten, value, "month {month}");
        }
    }

    #[test]
    fn test_quarter_is_derived_from_month() {
        let cases = [(1, 1), (3, 1), (4, 2), (6, 2), (7, 3), (10, 4), (12, 4)];
        for (month, quarter) in cases {
            let value = IncompleteValue::new().set(FieldKind::Month, month);
            assert_eq!(value.get(FieldKind::Quarter), Some(quarter), "month {month}");
        }
    }

    #[test]
    fn test_clear() {
        let value = IncompleteValue::new()
            .set(FieldKind::Month, 4)
            .set(FieldKind::Day, 12);
        let cleared = value.clear(FieldKind::Quarter);
        assert_eq!(cleared.get(FieldKind::Month), None);
        assert_eq!(cleared.get(FieldKind::Day), Some(12));
    }

    #[test]
    fn test_copy_from() {
        let source = IncompleteValue::from_date(&naive(2024, 4, 30, 10, 15, 0));
        let target = IncompleteValue::new().set(FieldKind::Day, 1);
        let copied = target.copy_from(&source, date_fields());
        assert_eq!(copied.get(FieldKind::Year), Some(2024));
        assert_eq!(copied.get(FieldKind::Month), Some(4));
        assert_eq!(copied.get(FieldKind::Day), Some(30));
        assert_eq!(copied.get(FieldKind::Hour), None);
    }

    #[test]
    fn test_complete_and_cleared() {
        let required = date_fields();
        let empty = IncompleteValue::new();
        assert!(empty.is_cleared(required));
        assert!(!empty.is_complete(required));

        let partial = empty.set(FieldKind::Day, 31).set(FieldKind::Month, 4);
        assert!(!partial.is_cleared(required));
        assert!(!partial.is_complete(required));

        let full = partial.set(FieldKind::Year, 2024);
        assert!(full.is_complete(required));
    }

    #[test]
    fn test_to_date_clamps_day_to_month() {
        let value = IncompleteValue::new()
            .set(FieldKind::Day, 31)
            .set(FieldKind::Month, 4)
            .set(FieldKind::Year, 2024);
        let date = value.to_date(naive(2024, 1, 15, 0, 0, 0), DateParts::ALL);
        assert_eq!(date, naive(2024, 4, 30, 0, 0, 0));
        assert!(!value.validate(&date, date_fields()));
    }

    #[test]
    fn test_to_date_month_only_does_not_overflow() {
        // base day 31 must not push February into March
        let value = IncompleteValue::new().set(FieldKind::Month, 2);
        let date = value.to_date(naive(2023, 1, 31, 0, 0, 0), DateParts::ALL);
        assert_eq!(date, naive(2023, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_to_date_weekday_fallback() {
        // 2024-01-17 is a Wednesday; Friday of that week is the 19th
        let value = IncompleteValue::new().set(FieldKind::Weekday, 5);
        let date = value.to_date(naive(2024, 1, 17, 0, 0, 0), DateParts::ALL);
        assert_eq!(date, naive(2024, 1, 19, 0, 0, 0));

        // Sunday before the 1st of the month stays inside the month
        let date = IncompleteValue::new()
            .set(FieldKind::Weekday, 0)
            .to_date(naive(2024, 1, 2, 0, 0, 0), DateParts::ALL);
        assert_eq!(date, naive(2024, 1, 7, 0, 0, 0));
    }

    #[test]
    fn test_to_date_parts() {
        let value = IncompleteValue::from_date(&naive(2020, 6, 15, 13, 45, 30));
        let base = naive(2024, 1, 1, 8, 0, 0);

        assert_eq!(
            value.to_date(base, DateParts::DATE),
            naive(2020, 6, 15, 8, 0, 0)
        );
        assert_eq!(
            value.to_date(base, DateParts::TIME),
            naive(2024, 1, 1, 13, 45, 30)
        );
    }

    #[test]
    fn test_to_date_day_period_without_hour() {
        let value = IncompleteValue::new().set(FieldKind::DayPeriod, PM);
        let date = value.to_date(naive(2024, 1, 1, 9, 0, 0), DateParts::ALL);
        assert_eq!(date.hour(), 21);
    }

    #[test]
    fn test_validate_matches_components() {
        let date = naive(2024, 4, 30, 0, 0, 0);
        let value = IncompleteValue::from_date(&date);
        assert!(value.validate(&date, date_fields()));

        let weekday_required = date_fields().with(FieldKind::Weekday);
        let wrong_weekday = value.set(FieldKind::Weekday, 0);
        assert!(!wrong_weekday.validate(&date, weekday_required));
    }

    #[test]
    fn test_from_date_and_component() {
        let date = naive(2024, 11, 5, 18, 7, 9);
        let value = IncompleteValue::from_date(&date);
        assert_eq!(value.get(FieldKind::Year), Some(2024));
        assert_eq!(value.get(FieldKind::Quarter), Some(4));
        assert_eq!(value.get(FieldKind::Weekday), Some(2));
        assert_eq!(value.get(FieldKind::DayPeriod), Some(PM));
        assert_eq!(value.get(FieldKind::Second), Some(9));
        assert_eq!(component(&date, FieldKind::Quarter), 4);
    }

    #[test]
    fn test_serde_round_trip() {
        let value = IncompleteValue::new()
            .set(FieldKind::Day, 31)
            .set(FieldKind::Hour, 14);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains(r#""dayPeriod":1"#));
        let parsed: IncompleteValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, parsed);
    }
}
