use std::{cmp::Ordering, fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Months, TimeDelta};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::FieldOptions;
use crate::field::{DateFieldState, FieldEvent, FieldUpdate, Key, SegmentedField, Selection, Transition};
use crate::format::{parse_iso, resolve_local, to_iso};
use crate::sections::{EditableSection, stitch};
use crate::tokenizer::{Section, tokenize};
use crate::types::FieldKind;
use crate::{MONTHS_PER_QUARTER, ParseError, RANGE_SEPARATOR, prelude::*};

/// A committed range between two instants (inclusive).
/// The start must be less than or equal to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: DateTime<Tz>,
    end:   DateTime<Tz>,
}

/// Error type for date range operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Start is after end.
    #[error("Invalid date range: start ({start}) is after end ({end})")]
    InvalidRange { start: String, end: String },

    /// One of the endpoints failed to parse.
    #[error(transparent)]
    ParseError(#[from] ParseError),

    /// Invalid range format.
    #[error("Invalid range format: {0}")]
    InvalidFormat(String),
}

impl DateRange {
    /// Creates a new date range with validation.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidRange` if start > end.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvalidRange {
                start: to_iso(&start),
                end:   to_iso(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Orders the endpoints instead of rejecting them.
    fn ordered(a: DateTime<Tz>, b: DateTime<Tz>) -> Self {
        if a > b {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub const fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        self.start <= *instant && *instant <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{RANGE_SEPARATOR}{}", to_iso(&self.start), to_iso(&self.end))
    }
}

impl FromStr for DateRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // ISO 8601 interval: RANGE_SEPARATOR separates start/end
        let separator_count = trimmed.matches(RANGE_SEPARATOR).count();

        match separator_count {
            0 => Err(RangeError::InvalidFormat(format!(
                "No range separator found (expected '{RANGE_SEPARATOR}'): {s}"
            ))),
            1 => {
                let (start_str, end_str) = trimmed.split_once(RANGE_SEPARATOR).ok_or_else(|| {
                    RangeError::InvalidFormat(format!(
                        "Separator '{RANGE_SEPARATOR}' not found despite count == 1"
                    ))
                })?;

                let start = parse_iso(start_str, Tz::UTC)?;
                let end = parse_iso(end_str, Tz::UTC)?;

                Self::new(start, end)
            },
            _ => Err(RangeError::InvalidFormat(format!(
                "Too many '{RANGE_SEPARATOR}' separators: expected 1, found {separator_count}"
            ))),
        }
    }
}

impl PartialOrd for DateRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateRange {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare starts first, then ends
        match self.start.cmp(&other.start) {
            Ordering::Equal => self.end.cmp(&other.end),
            ord => ord,
        }
    }
}

impl Serialize for DateRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Start of the `unit` containing `naive`.
fn floor_to(naive: NaiveDateTime, unit: FieldKind) -> NaiveDateTime {
    let date = naive.date();
    let first_month = |month: u32| {
        NaiveDate::from_ymd_opt(date.year(), month, 1)
            .unwrap_or(date)
            .and_time(NaiveTime::MIN)
    };
    let truncated = |hour: u32, minute: u32, second: u32| {
        NaiveTime::from_hms_opt(hour, minute, second).map_or(naive, |time| date.and_time(time))
    };

    match unit {
        FieldKind::Year => first_month(1),
        FieldKind::Quarter => {
            let per_quarter = MONTHS_PER_QUARTER as u32;
            first_month((date.month() - 1) / per_quarter * per_quarter + 1)
        }
        FieldKind::Month => first_month(date.month()),
        FieldKind::Weekday | FieldKind::Day => date.and_time(NaiveTime::MIN),
        FieldKind::DayPeriod | FieldKind::Hour => truncated(naive.hour(), 0, 0),
        FieldKind::Minute => truncated(naive.hour(), naive.minute(), 0),
        FieldKind::Second => truncated(naive.hour(), naive.minute(), naive.second()),
    }
}

/// Last millisecond of the `unit` containing `naive`.
fn ceil_to(naive: NaiveDateTime, unit: FieldKind) -> NaiveDateTime {
    let floor = floor_to(naive, unit);
    let next = match unit {
        FieldKind::Year => floor.checked_add_months(Months::new(12)),
        FieldKind::Quarter => floor.checked_add_months(Months::new(MONTHS_PER_QUARTER as u32)),
        FieldKind::Month => floor.checked_add_months(Months::new(1)),
        FieldKind::Weekday | FieldKind::Day => floor.checked_add_signed(TimeDelta::days(1)),
        FieldKind::DayPeriod | FieldKind::Hour => floor.checked_add_signed(TimeDelta::hours(1)),
        FieldKind::Minute => floor.checked_add_signed(TimeDelta::minutes(1)),
        FieldKind::Second => floor.checked_add_signed(TimeDelta::seconds(1)),
    };
    next.and_then(|next| next.checked_sub_signed(TimeDelta::milliseconds(1)))
        .unwrap_or(floor)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
}

/// Two date fields joined by a literal delimiter.
///
/// Navigation runs over the stitched sections; edits go to the side that
/// owns the selected section. A range is committed once both sides hold a
/// value, ordered and widened to whole units of the format's finest field.
#[derive(Debug, Clone)]
pub struct RangeFieldState {
    start:     DateFieldState,
    end:       DateFieldState,
    delimiter: String,
    sections:  Vec<EditableSection>,
    selection: Selection,
    value:     Option<DateRange>,
    revision:  u64,
}

impl RangeFieldState {
    pub fn new(options: FieldOptions) -> Self {
        let layout: Arc<[Section]> = tokenize(&options.format, options.locale).into();
        let delimiter = options.range_delimiter.clone();
        let options = Arc::new(options);

        let mut state = Self {
            start: DateFieldState::with_layout(Arc::clone(&options), Arc::clone(&layout)),
            end: DateFieldState::with_layout(options, layout),
            delimiter,
            sections: Vec::new(),
            selection: Selection::None,
            value: None,
            revision: 0,
        };
        state.render();
        state
    }

    pub const fn start(&self) -> &DateFieldState {
        &self.start
    }

    pub const fn end(&self) -> &DateFieldState {
        &self.end
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Hidden form field values for the start and the end.
    pub fn form_values(&self) -> (String, String) {
        self.value.as_ref().map_or_else(
            || (String::new(), String::new()),
            |range| (to_iso(&range.start), to_iso(&range.end)),
        )
    }

    fn render(&mut self) {
        self.sections = stitch(self.start.sections(), &self.delimiter, self.end.sections());
        self.revision += 1;
    }

    const fn side(&self, side: Side) -> &DateFieldState {
        match side {
            Side::Start => &self.start,
            Side::End => &self.end,
        }
    }

    const fn side_mut(&mut self, side: Side) -> &mut DateFieldState {
        match side {
            Side::Start => &mut self.start,
            Side::End => &mut self.end,
        }
    }

    fn offset(&self, side: Side) -> usize {
        match side {
            Side::Start => 0,
            Side::End => self.start.sections().len() + 1,
        }
    }

    /// Side and side-local index of a stitched section. The delimiter has none.
    fn locate(&self, idx: usize) -> Option<(Side, usize)> {
        let start_len = self.start.sections().len();
        match idx.cmp(&start_len) {
            Ordering::Less => Some((Side::Start, idx)),
            Ordering::Equal => None,
            Ordering::Greater => {
                let local = idx - start_len - 1;
                (local < self.end.sections().len()).then_some((Side::End, local))
            }
        }
    }

    fn active(&self) -> Option<(Side, usize)> {
        match self.selection {
            Selection::Section(idx) => self.locate(idx),
            Selection::None | Selection::All => None,
        }
    }

    fn first_editable(&self) -> Option<usize> {
        self.sections.iter().position(|section| section.is_editable())
    }

    fn last_editable(&self) -> Option<usize> {
        self.sections.iter().rposition(|section| section.is_editable())
    }

    /// Global selection for a side's own selection.
    fn selection_of(&self, side: Side) -> Selection {
        match self.side(side).selection() {
            Selection::Section(local) => Selection::Section(self.offset(side) + local),
            other => other,
        }
    }

    /// Recomputes the committed range from the two sides.
    fn settle(mut self) -> (Self, Option<FieldUpdate<DateRange>>) {
        let mut update = None;

        match (self.start.value().copied(), self.end.value().copied()) {
            (Some(a), Some(b)) => {
                let range = self.widen(DateRange::ordered(a, b));

                if self.accepts(&range) {
                    if self.start.value() != Some(&range.start) {
                        self.start = self.start.with_value(Some(range.start));
                    }
                    if self.end.value() != Some(&range.end) {
                        self.end = self.end.with_value(Some(range.end));
                    }

                    if self.value != Some(range) {
                        tracing::debug!(range = %range, "Committing range");
                        self.value = Some(range);
                        update = Some(FieldUpdate::Committed(range));
                    }
                } else {
                    tracing::debug!(range = %range, "Widened range rejected by field constraints");
                    if self.value.take().is_some() {
                        update = Some(FieldUpdate::Cleared);
                    }
                }
            },
            _ => {
                if self.value.take().is_some() {
                    tracing::debug!("Range cleared");
                    update = Some(FieldUpdate::Cleared);
                }
            },
        }

        self.render();
        tracing::trace!(
            revision = self.revision,
            committed = self.value.is_some(),
            "Settled range"
        );
        (self, update)
    }

    /// Widens a range to whole units of the format's finest field.
    fn widen(&self, range: DateRange) -> DateRange {
        let Some(unit) = self.start.finest_unit() else {
            return range;
        };
        let tz = self.start.options().time_zone;
        DateRange {
            start: resolve_local(tz, floor_to(range.start.naive_local(), unit)),
            end:   resolve_local(tz, ceil_to(range.end.naive_local(), unit)),
        }
    }

    /// Both widened endpoints pass the min/max and "unavailable" checks.
    fn accepts(&self, range: &DateRange) -> bool {
        let options = self.start.options();
        options.accepts(&range.start) && options.accepts(&range.end)
    }

    fn settled(self) -> Transition<Self, DateRange> {
        let (state, update) = self.settle();
        Transition::handled(state, update)
    }

    fn move_to(&self, selection: Selection) -> Transition<Self, DateRange> {
        let target = match selection {
            Selection::Section(idx) => self.locate(idx),
            Selection::None | Selection::All => None,
        };
        let local_selection = |side: Side| match target {
            Some((owner, local)) if owner == side => Selection::Section(local),
            _ => Selection::None,
        };

        let mut next = self.clone();
        next.start = next.start.move_to(local_selection(Side::Start)).state;
        next.end = next.end.move_to(local_selection(Side::End)).state;
        next.selection = selection;
        next.settled()
    }

    fn navigate(&self, key: Key) -> Transition<Self, DateRange> {
        let target = match key {
            Key::Home => self.first_editable(),
            Key::End => self.last_editable(),
            Key::ArrowLeft | Key::ArrowRight => {
                let forward = key == Key::ArrowRight;
                match self.selection {
                    Selection::Section(idx) => self.sections.get(idx).and_then(|section| {
                        if forward {
                            section.next_editable_section
                        } else {
                            section.previous_editable_section
                        }
                    }),
                    Selection::All if forward => self.last_editable(),
                    Selection::All => self.first_editable(),
                    Selection::None if forward => self.first_editable(),
                    Selection::None => self.last_editable(),
                }
            },
            _ => None,
        };
        target.map_or_else(
            || Transition::unhandled(self.clone()),
            |idx| self.move_to(Selection::Section(idx)),
        )
    }

    /// Sends an edit to the side owning the selected section.
    fn forward(&self, event: FieldEvent) -> Transition<Self, DateRange> {
        let Some((side, local)) = self.active() else {
            return Transition::unhandled(self.clone());
        };

        let transition = self.side(side).apply(event.clone());
        if !transition.handled {
            // backspace on the end's empty first section crosses the delimiter
            let at_end_start = side == Side::End && self.end.first_editable() == Some(local);
            if at_end_start && event == FieldEvent::Key(Key::Backspace) {
                if let Some(previous) = self.start.last_editable() {
                    return self.move_to(Selection::Section(previous));
                }
            }
            return Transition::unhandled(self.clone());
        }

        let completed = transition.state.completed_section();
        let mut next = self.clone();
        *next.side_mut(side) = transition.state;
        next.selection = next.selection_of(side);

        // completing the start's last section moves on to the end
        let start_done = side == Side::Start
            && completed == Some(local)
            && self.start.last_editable() == Some(local);
        if start_done {
            if let Some(first) = next.end.first_editable() {
                next.start = next.start.with_selection(Selection::None);
                next.end = next.end.with_selection(Selection::Section(first));
                next.selection = next.selection_of(Side::End);
            }
        }

        next.settled()
    }

    fn clear_all(&self) -> Transition<Self, DateRange> {
        let mut next = self.clone();
        next.start = next.start.with_value(None);
        next.end = next.end.with_value(None);
        next.settled()
    }

    fn confirm(&self) -> Transition<Self, DateRange> {
        let mut next = self.clone();
        next.start = next.start.apply(FieldEvent::Blur).state;
        next.end = next.end.apply(FieldEvent::Blur).state;
        next.selection = Selection::None;
        next.settled()
    }

    /// Splits pasted text on the delimiter, or on the delimiter without its
    /// surrounding whitespace.
    fn split<'a>(&self, text: &'a str) -> Option<(&'a str, &'a str)> {
        text.split_once(self.delimiter.as_str()).or_else(|| {
            Some(self.delimiter.trim())
                .filter(|bare| !bare.is_empty())
                .and_then(|bare| text.split_once(bare))
        })
    }

    fn paste(&self, text: &str) -> Transition<Self, DateRange> {
        let Some((start_text, end_text)) = self.split(text) else {
            tracing::debug!(text = %text, "Pasted range has no delimiter");
            return Transition::unhandled(self.clone());
        };
        let (start_text, end_text) = (start_text.trim(), end_text.trim());

        if let Err(err) = self.start.parse(start_text).and_then(|_| self.end.parse(end_text)) {
            tracing::debug!(error = %err, "Rejected pasted range");
            return Transition::unhandled(self.clone());
        }

        let mut next = self.clone();
        next.start = next.start.apply(FieldEvent::Paste(start_text.to_owned())).state;
        next.end = next.end.apply(FieldEvent::Paste(end_text.to_owned())).state;
        next.settled()
    }

    fn handle_key(&self, key: Key) -> Transition<Self, DateRange> {
        match key {
            Key::Home | Key::End | Key::ArrowLeft | Key::ArrowRight => self.navigate(key),
            Key::SelectAll => self.move_to(Selection::All),
            Key::Backspace | Key::Delete if self.selection == Selection::All => self.clear_all(),
            _ => self.forward(FieldEvent::Key(key)),
        }
    }
}

impl SegmentedField for RangeFieldState {
    type Value = DateRange;

    fn sections(&self) -> &[EditableSection] {
        &self.sections
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn value(&self) -> Option<&DateRange> {
        self.value.as_ref()
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn is_invalid(&self) -> bool {
        let rejected =
            self.value.is_none() && self.start.value().is_some() && self.end.value().is_some();
        rejected || self.start.is_invalid() || self.end.is_invalid()
    }

    fn apply(&self, event: FieldEvent) -> Transition<Self, DateRange> {
        match event {
            FieldEvent::Key(key) => self.handle_key(key),
            FieldEvent::Focus(idx) => {
                if self.sections.get(idx).is_some_and(|section| section.is_editable()) {
                    self.move_to(Selection::Section(idx))
                } else {
                    Transition::unhandled(self.clone())
                }
            },
            FieldEvent::Blur => self.confirm(),
            FieldEvent::Paste(text) => self.paste(&text),
            FieldEvent::IncrementToMax | FieldEvent::DecrementToMin => self.forward(event),
        }
    }

    fn with_value(&self, value: Option<DateRange>) -> Self {
        let value = value.map(|range| self.widen(range));
        let mut next = self.clone();
        next.start = next.start.with_value(value.map(|range| range.start));
        next.end = next.end.with_value(value.map(|range| range.end));
        next.value = value;
        next.render();
        next
    }
}
