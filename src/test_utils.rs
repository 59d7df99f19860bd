use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

use crate::config::FieldOptions;
use crate::field::{DateFieldState, FieldEvent, FieldUpdate, Key, SegmentedField};
use crate::range::RangeFieldState;
use crate::prelude::*;
use crate::sections::EditableSection;

pub fn naive(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .unwrap()
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Tz> {
    Tz::UTC
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .unwrap()
}

pub fn berlin(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Tz> {
    chrono_tz::Europe::Berlin
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .unwrap()
}

pub fn placeholder() -> NaiveDateTime {
    naive(2024, 1, 15, 0, 0, 0)
}

/// English, UTC, with a fixed placeholder date.
pub fn options(format: &str) -> FieldOptions {
    FieldOptions::new(format).with_placeholder(placeholder())
}

pub fn field(format: &str) -> DateFieldState {
    DateFieldState::new(options(format))
}

pub fn range_field(format: &str) -> RangeFieldState {
    RangeFieldState::new(options(format))
}

/// Applies `keys` in order, collecting every update.
pub fn press<F: SegmentedField>(state: F, keys: &[Key]) -> (F, Vec<FieldUpdate<F::Value>>) {
    keys.iter().fold((state, Vec::new()), |(state, mut updates), key| {
        let transition = state.apply(FieldEvent::Key(*key));
        updates.extend(transition.update);
        (transition.state, updates)
    })
}

pub fn type_text<F: SegmentedField>(state: F, text: &str) -> (F, Vec<FieldUpdate<F::Value>>) {
    let keys: Vec<Key> = text.chars().map(Key::Char).collect();
    press(state, &keys)
}

/// Every editable section is reachable both ways from its neighbours.
pub fn assert_linked(sections: &[EditableSection]) {
    for (idx, section) in sections.iter().enumerate() {
        if !section.is_editable() {
            assert_eq!(section.next_editable_section, None, "section {idx}");
            assert_eq!(section.previous_editable_section, None, "section {idx}");
            continue;
        }
        let next = section.next_editable_section.unwrap();
        let previous = section.previous_editable_section.unwrap();
        assert_eq!(sections[next].previous_editable_section, Some(idx), "section {idx}");
        assert_eq!(sections[previous].next_editable_section, Some(idx), "section {idx}");
    }
}
