//! Section materializer.
//!
//! Combines tokenized sections with the value being displayed and produces
//! [`EditableSection`]s: rendered text, numeric value, bounds, character
//! offsets and navigation links. A new array is produced on every edit.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::consts::{FEBRUARY, FEBRUARY_DAYS_LEAP, MAX_DAYS_IN_MONTH};
use crate::IncompleteValue;
use crate::format::{display_value, render_value, section_value};
use crate::locale::Locale;
use crate::prelude::*;
use crate::tokenizer::Section;
use crate::types::{FieldKind, FieldSet, SectionKind, days_in_month};

/// A section as rendered for one state of the field.
#[derive(Debug, Clone, PartialEq, Eq, Deref, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableSection {
    #[deref]
    #[serde(flatten)]
    pub section: Section,
    /// `None` until the user has supplied the field
    pub value: Option<i32>,
    pub text_value: String,
    /// Character offsets into the concatenated text, `end` exclusive
    pub start: usize,
    pub end: usize,
    pub min_value: Option<i32>,
    pub max_value: Option<i32>,
    pub previous_editable_section: Option<usize>,
    pub next_editable_section: Option<usize>,
}

impl EditableSection {
    fn literal(section: Section, text_value: String) -> Self {
        Self {
            section,
            value: None,
            text_value,
            start: 0,
            end: 0,
            min_value: None,
            max_value: None,
            previous_editable_section: None,
            next_editable_section: None,
        }
    }

    pub const fn bounds(&self) -> Option<(i32, i32)> {
        match (self.min_value, self.max_value) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

/// Whether the value of `field` counts as supplied.
///
/// A weekday is implied once year, month and day are all known.
pub(crate) fn is_confirmed(valid: FieldSet, field: FieldKind) -> bool {
    valid.contains(field.storage())
        || (field == FieldKind::Weekday
            && valid.contains(FieldKind::Year)
            && valid.contains(FieldKind::Month)
            && valid.contains(FieldKind::Day))
}

/// Upper bound of the day section.
///
/// Until the month is confirmed any day up to 31 may be typed; a confirmed
/// February with an unknown year allows the 29th.
pub(crate) fn day_upper_bound(display: &NaiveDateTime, valid: FieldSet) -> i32 {
    if !valid.contains(FieldKind::Month) {
        return MAX_DAYS_IN_MONTH;
    }
    let month = display.month() as i32;
    if month == FEBRUARY && !valid.contains(FieldKind::Year) {
        FEBRUARY_DAYS_LEAP
    } else {
        days_in_month(display.year(), month)
    }
}

/// Digits typed into a section that has not accepted them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pending<'a> {
    pub index: usize,
    pub keys: &'a str,
}

/// Renders `sections` for `display`.
///
/// Fields outside `valid` show their placeholder and carry no value.
pub fn materialize(
    sections: &[Section],
    display: &DateTime<Tz>,
    valid: FieldSet,
    locale: &Locale,
) -> Vec<EditableSection> {
    materialize_with_pending(sections, display, valid, None, None, locale)
}

/// Like [`materialize`], for a value still being entered.
///
/// Fields present in `entered` show the entered component even when
/// `display` had to round it (day 31 of April). A pending section shows the
/// digits typed so far.
pub(crate) fn materialize_with_pending(
    sections: &[Section],
    display: &DateTime<Tz>,
    valid: FieldSet,
    entered: Option<&IncompleteValue>,
    pending: Option<Pending<'_>>,
    locale: &Locale,
) -> Vec<EditableSection> {
    let naive = display.naive_local();
    let mut offset = 0usize;

    let mut editable: Vec<EditableSection> = sections
        .iter()
        .enumerate()
        .map(|(idx, section)| {
            let mut rendered = match section.kind {
                SectionKind::Literal => {
                    EditableSection::literal(section.clone(), section.format_token.clone())
                }
                SectionKind::TimeZoneName => {
                    let text = crate::format::format_date(
                        std::slice::from_ref(section),
                        display,
                        locale,
                    );
                    EditableSection::literal(section.clone(), text)
                }
                SectionKind::Field(field) => {
                    let typed = pending.filter(|p| p.index == idx).map(|p| p.keys);
                    render_field(section, field, &naive, valid, entered, typed, locale)
                }
            };

            let len = rendered.text_value.chars().count();
            rendered.start = offset;
            rendered.end = offset + len;
            offset += len;
            rendered
        })
        .collect();

    link_sections(&mut editable);
    editable
}

fn render_field(
    section: &Section,
    field: FieldKind,
    display: &NaiveDateTime,
    valid: FieldSet,
    entered: Option<&IncompleteValue>,
    typed: Option<&str>,
    locale: &Locale,
) -> EditableSection {
    let (min, mut max) = section.static_bounds().unwrap_or((0, 0));
    if field == FieldKind::Day {
        max = day_upper_bound(display, valid);
    }

    // the weekday always follows the displayed date
    let value = is_confirmed(valid, field)
        .then(|| {
            entered
                .filter(|_| field != FieldKind::Weekday)
                .and_then(|entered| entered.get(field))
                .map(|stored| display_value(section, stored))
                .or_else(|| section_value(section, display))
        })
        .flatten();

    let text_value = match (typed, value) {
        (Some(keys), _) => {
            if section.has_leading_zeros {
                format!("{keys:0>width$}", width = section.max_length())
            } else {
                keys.to_owned()
            }
        }
        (None, Some(shown)) => render_value(section.style, field, shown, locale),
        (None, None) => section.placeholder.clone(),
    };

    EditableSection {
        section: section.clone(),
        value,
        text_value,
        start: 0,
        end: 0,
        min_value: Some(min),
        max_value: Some(max),
        previous_editable_section: None,
        next_editable_section: None,
    }
}

/// Links the editable sections into a ring, in display order.
pub fn link_sections(sections: &mut [EditableSection]) {
    let order: Vec<usize> = sections
        .iter()
        .enumerate()
        .filter(|(_, section)| section.is_editable())
        .map(|(idx, _)| idx)
        .collect();

    for section in sections.iter_mut() {
        section.previous_editable_section = None;
        section.next_editable_section = None;
    }

    let count = order.len();
    for (pos, idx) in order.iter().enumerate() {
        sections[*idx].previous_editable_section = Some(order[(pos + count - 1) % count]);
        sections[*idx].next_editable_section = Some(order[(pos + 1) % count]);
    }
}

/// Joins the sections of two values around a literal delimiter.
///
/// The end half's offsets and link indices are shifted past the start half
/// and the delimiter, then the ring is closed across both halves.
pub fn stitch(
    start: &[EditableSection],
    delimiter: &str,
    end: &[EditableSection],
) -> Vec<EditableSection> {
    let start_len = start.last().map_or(0, |section| section.end);
    let delimiter_len = delimiter.chars().count();
    let text_shift = start_len + delimiter_len;
    let index_shift = start.len() + 1;

    let mut joined = Vec::with_capacity(start.len() + end.len() + 1);
    joined.extend_from_slice(start);

    let mut separator = EditableSection::literal(
        Section::literal(delimiter.to_owned()),
        delimiter.to_owned(),
    );
    separator.start = start_len;
    separator.end = text_shift;
    joined.push(separator);

    joined.extend(end.iter().cloned().map(|mut section| {
        section.start += text_shift;
        section.end += text_shift;
        section.previous_editable_section =
            section.previous_editable_section.map(|idx| idx + index_shift);
        section.next_editable_section = section.next_editable_section.map(|idx| idx + index_shift);
        section
    }));

    let start_first = (0..start.len()).find(|&idx| joined[idx].is_editable());
    let start_last = (0..start.len()).rev().find(|&idx| joined[idx].is_editable());
    let end_first = (index_shift..joined.len()).find(|&idx| joined[idx].is_editable());
    let end_last = (index_shift..joined.len())
        .rev()
        .find(|&idx| joined[idx].is_editable());

    match (start_first, start_last, end_first, end_last) {
        (Some(start_first), Some(start_last), Some(end_first), Some(end_last)) => {
            joined[start_last].next_editable_section = Some(end_first);
            joined[end_first].previous_editable_section = Some(start_last);
            joined[end_last].next_editable_section = Some(start_first);
            joined[start_first].previous_editable_section = Some(end_last);
        }
        _ => link_sections(&mut joined),
    }

    tracing::trace!(
        sections = joined.len(),
        text_len = joined.last().map_or(0, |section| section.end),
        "Stitched range sections"
    );
    joined
}

/// Concatenated text of all sections.
pub fn sections_text(sections: &[EditableSection]) -> String {
    sections
        .iter()
        .map(|section| section.text_value.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::EN;
    use crate::test_utils::{assert_linked, berlin, utc};
    use crate::tokenizer::tokenize;

    fn all_date_fields() -> FieldSet {
        [FieldKind::Year, FieldKind::Month, FieldKind::Day]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_placeholder_text_until_valid() {
        let sections = tokenize("DD.MM.YYYY", &EN);
        let display = utc(2024, 4, 30, 0, 0, 0);

        let empty = materialize(&sections, &display, FieldSet::EMPTY, &EN);
        assert_eq!(sections_text(&empty), "DD.MM.YYYY");
        assert!(empty.iter().all(|s| s.value.is_none()));

        let day_only = materialize(
            &sections,
            &display,
            FieldSet::EMPTY.with(FieldKind::Day),
            &EN,
        );
        assert_eq!(sections_text(&day_only), "30.MM.YYYY");
        assert_eq!(day_only[0].value, Some(30));

        let full = materialize(&sections, &display, all_date_fields(), &EN);
        assert_eq!(sections_text(&full), "30.04.2024");
    }

    #[test]
    fn test_offsets_are_running_char_counts() {
        let sections = tokenize("D MMMM YYYY", &EN);
        let display = utc(2024, 4, 5, 0, 0, 0);
        let rendered = materialize(&sections, &display, all_date_fields(), &EN);

        let offsets: Vec<(usize, usize)> = rendered.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(offsets, vec![(0, 1), (1, 2), (2, 7), (7, 8), (8, 12)]);
        assert_eq!(sections_text(&rendered), "5 April 2024");
    }

    #[test]
    fn test_bounds() {
        let sections = tokenize("DD.MM.YYYY hh:mm A", &EN);
        let display = utc(2023, 2, 10, 0, 0, 0);

        let rendered = materialize(&sections, &display, FieldSet::EMPTY, &EN);
        assert_eq!(rendered[0].bounds(), Some((1, 31)));
        assert_eq!(rendered[2].bounds(), Some((1, 12)));
        assert_eq!(rendered[4].bounds(), Some((1, 9999)));
        assert_eq!(rendered[6].bounds(), Some((1, 12)));
        assert_eq!(rendered[8].bounds(), Some((0, 59)));
        assert_eq!(rendered[1].bounds(), None);

        // February with an unknown year still allows the 29th
        let month_only = FieldSet::EMPTY.with(FieldKind::Month);
        let rendered = materialize(&sections, &display, month_only, &EN);
        assert_eq!(rendered[0].bounds(), Some((1, 29)));

        let rendered = materialize(&sections, &display, all_date_fields(), &EN);
        assert_eq!(rendered[0].bounds(), Some((1, 28)));
    }

    #[test]
    fn test_pending_digits_are_zero_padded() {
        let sections = tokenize("DD.MM.YYYY", &EN);
        let display = utc(2024, 4, 30, 0, 0, 0);
        let rendered = materialize_with_pending(
            &sections,
            &display,
            FieldSet::EMPTY,
            None,
            Some(Pending {
                index: 4,
                keys: "20",
            }),
            &EN,
        );
        assert_eq!(sections_text(&rendered), "DD.MM.0020");
        assert_eq!(rendered[4].value, None);
    }

    #[test]
    fn test_entered_components_override_rounded_display() {
        let sections = tokenize("DD.MM.YYYY", &EN);
        // 31 April rounds down to the 30th when materialized
        let display = utc(2024, 4, 30, 0, 0, 0);
        let entered = IncompleteValue::new()
            .set(FieldKind::Day, 31)
            .set(FieldKind::Month, 4)
            .set(FieldKind::Year, 2024);
        let rendered = materialize_with_pending(
            &sections,
            &display,
            all_date_fields(),
            Some(&entered),
            None,
            &EN,
        );
        assert_eq!(sections_text(&rendered), "31.04.2024");
        assert_eq!(rendered[0].value, Some(31));
        assert_eq!(rendered[0].bounds(), Some((1, 30)));
    }

    #[test]
    fn test_time_zone_section_is_rendered_not_linked() {
        let sections = tokenize("HH:mm Z", &EN);
        let display = berlin(2024, 1, 10, 9, 30, 0);
        let rendered = materialize(&sections, &display, FieldSet::EMPTY, &EN);
        assert_eq!(sections_text(&rendered), "hh:mm +01:00");
        assert_eq!(rendered[4].next_editable_section, None);
        assert_eq!(rendered[2].next_editable_section, Some(0));
    }

    #[test]
    fn test_links_form_a_ring() {
        let sections = tokenize("DD.MM.YYYY HH:mm", &EN);
        let rendered = materialize(&sections, &utc(2024, 1, 1, 0, 0, 0), FieldSet::EMPTY, &EN);

        assert_linked(&rendered);
        assert_eq!(rendered[0].previous_editable_section, Some(8));
        assert_eq!(rendered[0].next_editable_section, Some(2));
        assert_eq!(rendered[8].next_editable_section, Some(0));
        assert_eq!(rendered[1].next_editable_section, None);
    }

    #[test]
    fn test_single_editable_section_links_to_itself() {
        let sections = tokenize("[Year] YYYY", &EN);
        let rendered = materialize(&sections, &utc(2024, 1, 1, 0, 0, 0), FieldSet::EMPTY, &EN);
        assert_eq!(rendered[1].next_editable_section, Some(1));
        assert_eq!(rendered[1].previous_editable_section, Some(1));
    }

    #[test]
    fn test_stitch_shifts_and_relinks() {
        let sections = tokenize("DD.MM.YYYY", &EN);
        let start = materialize(&sections, &utc(2024, 1, 1, 0, 0, 0), all_date_fields(), &EN);
        let end = materialize(&sections, &utc(2024, 1, 31, 0, 0, 0), all_date_fields(), &EN);

        let joined = stitch(&start, " — ", &end);
        assert_eq!(sections_text(&joined), "01.01.2024 — 31.01.2024");
        assert_eq!(joined.len(), 11);

        assert_linked(&joined);
        assert_eq!(joined[4].next_editable_section, Some(6));
        assert_eq!(joined[6].previous_editable_section, Some(4));
        assert_eq!(joined[10].next_editable_section, Some(0));
        assert_eq!(joined[0].previous_editable_section, Some(10));

        assert_eq!((joined[5].start, joined[5].end), (10, 13));
        assert_eq!((joined[6].start, joined[6].end), (13, 15));
        assert_eq!(joined[10].end, 23);

        // same result as linking the joined array from scratch
        let mut relinked = joined.clone();
        link_sections(&mut relinked);
        assert_eq!(relinked, joined);
    }
}
