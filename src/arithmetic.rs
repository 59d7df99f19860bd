//! Segment arithmetic: digit accumulation, letter matching and stepping.
//!
//! Everything here is a pure function of its inputs; the field controller
//! feeds the results back through [`IncompleteValue::set`].

use crate::consts::{DAYS_PER_WEEK, FEBRUARY, FEBRUARY_DAYS_LEAP, HOURS_PER_PERIOD, MIN_DAY};
use crate::format::pivot_year;
use crate::prelude::*;
use crate::tokenizer::{Section, TokenStyle};
use crate::types::{FieldKind, days_in_month, days_in_month_of};
use crate::{IncompleteValue, component};

/// Digits typed into a section so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedValue {
    pub keys: String,
    pub value: i32,
    /// No further digit could extend the value; the section is done.
    pub complete: bool,
}

/// Appends `digit` to the typed `keys`.
///
/// When the appended number would be too long or too large, typing starts
/// over with just `digit`. The value is complete once no further digit can
/// keep it within `max`. Returns `None` when the digit must be ignored: it
/// exceeds `max` on its own, or it completes a value below `min`.
pub fn type_digit(
    keys: &str,
    digit: char,
    max_len: usize,
    min: i32,
    max: i32,
) -> Option<TypedValue> {
    digit.to_digit(10)?;

    let mut next = format!("{keys}{digit}");
    if next.len() > max_len || !next.parse::<i32>().is_ok_and(|n| n <= max) {
        next = digit.to_string();
    }

    let value: i32 = next.parse().ok()?;
    if value > max {
        return None;
    }

    let complete = next.len() >= max_len || value.saturating_mul(10) > max;
    if complete && value < min {
        return None;
    }

    Some(TypedValue {
        keys: next,
        value,
        complete,
    })
}

/// Result of typing a letter into a name section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterMatch {
    /// Letters typed so far, lowercased
    pub keys: String,
    /// Index into the option list
    pub index: usize,
    /// Only one option matches; the section is done.
    pub unique: bool,
}

/// Matches the typed letters against `options` by case-insensitive prefix.
///
/// Typing the same letter again cycles through the options starting with it.
/// A letter that extends no match starts over on its own.
pub fn type_letter(
    keys: &str,
    letter: char,
    options: &[&str],
    current: Option<usize>,
) -> Option<LetterMatch> {
    let letter: String = letter.to_lowercase().collect();
    let lowered: Vec<String> = options.iter().map(|o| o.to_lowercase()).collect();
    let matching = |prefix: &str| -> Vec<usize> {
        lowered
            .iter()
            .enumerate()
            .filter(|(_, option)| option.starts_with(prefix))
            .map(|(idx, _)| idx)
            .collect()
    };

    let accumulated = format!("{keys}{letter}");
    let found = matching(&accumulated);
    if let Some(first) = found.first() {
        return Some(LetterMatch {
            keys: accumulated,
            index: *first,
            unique: found.len() == 1,
        });
    }

    let single = matching(&letter);
    let repeating = !keys.is_empty() && keys.chars().all(|c| c.to_string() == letter);
    if repeating && single.len() > 1 {
        let index = current
            .and_then(|current| single.iter().find(|idx| **idx > current))
            .or_else(|| single.first())
            .copied()?;
        return Some(LetterMatch {
            keys: accumulated,
            index,
            unique: false,
        });
    }

    single.first().map(|index| LetterMatch {
        keys: letter,
        index: *index,
        unique: single.len() == 1,
    })
}

/// Adds `amount` to `value`, wrapping around inside `[min, max]`.
pub const fn wrap(value: i32, amount: i32, min: i32, max: i32) -> i32 {
    min + (value - min + amount).rem_euclid(max - min + 1)
}

/// Next value of a section for an increment/decrement of `amount`.
///
/// A section the user has not supplied yet takes `seed` (the placeholder's
/// value) without stepping.
pub fn step_value(current: Option<i32>, seed: i32, amount: i32, min: i32, max: i32) -> i32 {
    match current {
        Some(value) => wrap(value.clamp(min, max), amount, min, max),
        None => seed.clamp(min, max),
    }
}

/// Converts a section's display value into the stored component.
///
/// A 12-hour hour keeps the day period already entered, or the one of
/// `display`; a two-digit year lands in `display`'s century.
pub(crate) fn to_stored(
    section: &Section,
    shown: i32,
    working: &IncompleteValue,
    display: &NaiveDateTime,
) -> i32 {
    match section.style {
        TokenStyle::Hour12 { .. } => {
            let period = working
                .get(FieldKind::DayPeriod)
                .unwrap_or_else(|| component(display, FieldKind::DayPeriod));
            shown % HOURS_PER_PERIOD + HOURS_PER_PERIOD * period
        }
        TokenStyle::TwoDigitYear => pivot_year(shown, display.year()),
        _ => shown,
    }
}

/// Day of the month that falls on `weekday` within the week of `display`,
/// kept inside the same month.
pub(crate) fn day_for_weekday(display: &NaiveDateTime, weekday: i32) -> i32 {
    let month_len = days_in_month_of(display.date());
    let current = component(display, FieldKind::Weekday);
    let day = display.day() as i32 + weekday.rem_euclid(DAYS_PER_WEEK) - current;
    if day < MIN_DAY {
        day + DAYS_PER_WEEK
    } else if day > month_len {
        day - DAYS_PER_WEEK
    } else {
        day
    }
}

/// Pulls an entered day back inside its month after the month or year moved.
#[must_use]
pub(crate) fn clamp_day(value: IncompleteValue) -> IncompleteValue {
    let (Some(day), Some(month)) = (value.get(FieldKind::Day), value.get(FieldKind::Month)) else {
        return value;
    };
    let month_len = match value.get(FieldKind::Year) {
        Some(year) => days_in_month(year, month),
        None if month == FEBRUARY => FEBRUARY_DAYS_LEAP,
        None => days_in_month(1, month),
    };
    if day > month_len {
        value.set(FieldKind::Day, month_len)
    } else {
        value
    }
}
