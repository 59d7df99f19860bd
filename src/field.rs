//! Field state controller.
//!
//! [`DateFieldState`] is an immutable snapshot of a segmented date field.
//! Every event produces a new snapshot through [`SegmentedField::apply`],
//! together with the update (if any) that must be reported to the host.
//! [`DateField`] is the thin mutable shell that owns a snapshot and the
//! update callback.

use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::arithmetic::{clamp_day, day_for_weekday, step_value, to_stored, type_digit, type_letter};
use crate::config::FieldOptions;
use crate::format::{names, parse_date, parse_iso, resolve_local, section_value, to_iso};
use crate::prelude::*;
use crate::sections::{EditableSection, Pending, materialize_with_pending, sections_text};
use crate::tokenizer::{Section, TokenStyle, finest_field, required_fields, tokenize};
use crate::types::{ContentType, FieldKind, FieldSet};
use crate::{DateParts, IncompleteValue, ParseError};

/// Keys the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    ArrowLeft,
    ArrowRight,
    Backspace,
    Delete,
    /// The platform's select-all shortcut
    SelectAll,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Key(Key),
    /// A section was focused (clicked or tabbed into)
    Focus(usize),
    /// Focus left the field; pending input is confirmed
    Blur,
    Paste(String),
    IncrementToMax,
    DecrementToMin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    None,
    Section(usize),
    All,
}

/// Change of the committed value reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<V> {
    Committed(V),
    Cleared,
}

impl<V> FieldUpdate<V> {
    pub const fn value(&self) -> Option<&V> {
        match self {
            Self::Committed(value) => Some(value),
            Self::Cleared => None,
        }
    }
}

/// Outcome of applying one event to a field state.
#[derive(Debug, Clone)]
pub struct Transition<S, V> {
    pub state: S,
    pub update: Option<FieldUpdate<V>>,
    /// `false` when the event did not apply; `state` is then unchanged.
    pub handled: bool,
}

impl<S, V> Transition<S, V> {
    pub fn handled(state: S, update: Option<FieldUpdate<V>>) -> Self {
        Self {
            state,
            update,
            handled: true,
        }
    }

    pub fn unhandled(state: S) -> Self {
        Self {
            state,
            update: None,
            handled: false,
        }
    }
}

/// Operations shared by single-value and range fields.
pub trait SegmentedField: Clone {
    type Value: Clone + PartialEq;

    fn sections(&self) -> &[EditableSection];

    fn selection(&self) -> Selection;

    /// The committed value.
    fn value(&self) -> Option<&Self::Value>;

    /// Incremented every time the sections are regenerated.
    fn revision(&self) -> u64;

    /// The text holds a complete entry that could not be committed.
    fn is_invalid(&self) -> bool;

    fn apply(&self, event: FieldEvent) -> Transition<Self, Self::Value>;

    /// Replaces the value from outside (initial value, controlled value,
    /// form reset). Never reported as an update.
    #[must_use]
    fn with_value(&self, value: Option<Self::Value>) -> Self;

    fn text(&self) -> String {
        sections_text(self.sections())
    }
}

/// Keys typed into one section that have not been settled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Typing {
    index: usize,
    keys: String,
    /// Digits are held back until complete; letters are applied as typed.
    digits: bool,
}

type Update = Option<FieldUpdate<DateTime<Tz>>>;

/// Snapshot of a single date/time field.
#[derive(Debug, Clone)]
pub struct DateFieldState {
    options: Arc<FieldOptions>,
    layout: Arc<[Section]>,
    required: FieldSet,
    present: FieldSet,
    value: Option<DateTime<Tz>>,
    placeholder: NaiveDateTime,
    working: IncompleteValue,
    valid: FieldSet,
    typing: Option<Typing>,
    selection: Selection,
    /// Section whose entry the last event completed
    completed: Option<usize>,
    sections: Vec<EditableSection>,
    revision: u64,
}

impl DateFieldState {
    pub fn new(options: FieldOptions) -> Self {
        let layout: Arc<[Section]> = tokenize(&options.format, options.locale).into();
        Self::with_layout(Arc::new(options), layout)
    }

    pub(crate) fn with_layout(options: Arc<FieldOptions>, layout: Arc<[Section]>) -> Self {
        let required = required_fields(&layout);
        let present = layout
            .iter()
            .filter_map(Section::field)
            .map(FieldKind::storage)
            .collect::<FieldSet>()
            .union(required);
        let placeholder = options.placeholder_date();

        let mut state = Self {
            options,
            layout,
            required,
            present,
            value: None,
            placeholder,
            working: IncompleteValue::new(),
            valid: FieldSet::EMPTY,
            typing: None,
            selection: Selection::None,
            completed: None,
            sections: Vec::new(),
            revision: 0,
        };
        state.render();
        state
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Tokenized format.
    pub fn layout(&self) -> &[Section] {
        &self.layout
    }

    pub const fn working(&self) -> &IncompleteValue {
        &self.working
    }

    /// Fields the user has supplied since the value was last cleared.
    pub const fn valid_fields(&self) -> FieldSet {
        self.valid
    }

    pub const fn required_fields(&self) -> FieldSet {
        self.required
    }

    pub const fn placeholder(&self) -> NaiveDateTime {
        self.placeholder
    }

    /// Finest unit of the format, if it has any field.
    pub fn finest_unit(&self) -> Option<FieldKind> {
        finest_field(&self.layout)
    }

    /// Hidden form field value: UTC ISO 8601, or empty.
    pub fn form_value(&self) -> String {
        self.value.as_ref().map(to_iso).unwrap_or_default()
    }

    /// Digits are held back in a section, waiting for more input.
    pub const fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    pub(crate) const fn completed_section(&self) -> Option<usize> {
        self.completed
    }

    #[must_use]
    pub(crate) fn with_selection(&self, selection: Selection) -> Self {
        let mut next = self.clone();
        next.selection = selection;
        next
    }

    /// Parses `text` with the caller's parser, then the field's format, then
    /// as ISO 8601.
    pub fn parse(&self, text: &str) -> Result<DateTime<Tz>, ParseError> {
        if let Some(parsed) = self.options.custom_parse(text) {
            return Ok(parsed.with_timezone(&self.options.time_zone));
        }
        let tz = self.options.time_zone;
        parse_date(&self.layout, text, self.options.locale, tz, self.placeholder)
            .or_else(|err| parse_iso(text, tz).map_err(|_| err))
    }

    fn base(&self) -> NaiveDateTime {
        self.value
            .map_or(self.placeholder, |value| value.naive_local())
    }

    fn display_naive(&self) -> NaiveDateTime {
        self.working.to_date(self.base(), DateParts::ALL)
    }

    fn render(&mut self) {
        let display = self
            .value
            .unwrap_or_else(|| resolve_local(self.options.time_zone, self.display_naive()));
        let pending = self
            .typing
            .as_ref()
            .filter(|typing| typing.digits)
            .map(|typing| Pending {
                index: typing.index,
                keys: typing.keys.as_str(),
            });
        self.sections = materialize_with_pending(
            &self.layout,
            &display,
            self.valid,
            Some(&self.working),
            pending,
            self.options.locale,
        );
        self.revision += 1;
    }

    fn active(&self) -> Option<usize> {
        match self.selection {
            Selection::Section(idx) => self
                .sections
                .get(idx)
                .filter(|section| section.is_editable())
                .map(|_| idx),
            Selection::None | Selection::All => None,
        }
    }

    pub(crate) fn first_editable(&self) -> Option<usize> {
        self.sections.iter().position(|section| section.is_editable())
    }

    pub(crate) fn last_editable(&self) -> Option<usize> {
        self.sections.iter().rposition(|section| section.is_editable())
    }

    /// The value the current entry commits to: complete, consistent with the
    /// calendar and allowed by the field's constraints.
    fn candidate(&self) -> Option<DateTime<Tz>> {
        if self.required.is_empty()
            || !self.valid.is_superset(self.required)
            || !self.working.is_complete(self.required)
        {
            return None;
        }
        let naive = self.display_naive();
        if !self.working.validate(&naive, self.required) {
            return None;
        }
        let resolved = resolve_local(self.options.time_zone, naive);
        if !self.options.accepts(&resolved) {
            tracing::debug!(
                value = %to_iso(&resolved),
                "Complete value rejected by field constraints"
            );
            return None;
        }
        Some(resolved)
    }

    /// Stores an edited working value and decides whether it commits.
    fn settle(mut self, working: IncompleteValue, valid: FieldSet) -> (Self, Update) {
        self.working = working;
        self.valid = valid;
        let mut update = None;

        if valid.is_empty() {
            self.working = IncompleteValue::new();
            self.placeholder = self.options.placeholder_date();
            if self.value.take().is_some() {
                tracing::debug!("Field cleared");
                update = Some(FieldUpdate::Cleared);
            }
        } else if let Some(candidate) = self.candidate() {
            if self.value != Some(candidate) {
                tracing::debug!(value = %to_iso(&candidate), "Committing value");
                self.value = Some(candidate);
                self.working = IncompleteValue::from_date(&candidate.naive_local());
                update = Some(FieldUpdate::Committed(candidate));
            }
        } else if self.value.take().is_some() {
            tracing::debug!("Committed value withdrawn, entry is incomplete or invalid");
            update = Some(FieldUpdate::Cleared);
        }

        self.render();
        (self, update)
    }

    /// Writes a section's display value into the working value.
    fn with_section_value(self, idx: usize, shown: i32, stepped: bool) -> (Self, Update) {
        let Some(section) = self.layout.get(idx) else {
            return (self, None);
        };
        let Some(field) = section.field() else {
            return (self, None);
        };

        let display = self.display_naive();
        let stored = to_stored(section, shown, &self.working, &display);
        let mut working = self.working.set(field, stored);
        let valid = self.valid.with(field.storage());

        if field == FieldKind::Weekday && self.valid.contains(FieldKind::Day) {
            working = working.set(FieldKind::Day, day_for_weekday(&display, stored));
        }
        if stepped
            && matches!(field, FieldKind::Year | FieldKind::Quarter | FieldKind::Month)
            && self.valid.contains(FieldKind::Day)
        {
            working = clamp_day(working);
        }

        self.settle(working, valid)
    }

    /// Settles digits still held back, if they form an acceptable value.
    fn flush(&self) -> (Self, Update) {
        let mut next = self.clone();
        let Some(typing) = next.typing.take() else {
            return (next, None);
        };
        if !typing.digits {
            return (next, None);
        }

        let bounds = self
            .sections
            .get(typing.index)
            .and_then(EditableSection::bounds);
        if let (Ok(number), Some((min, max))) = (typing.keys.parse::<i32>(), bounds) {
            if (min..=max).contains(&number) {
                return next.with_section_value(typing.index, number, false);
            }
        }
        next.render();
        (next, None)
    }

    /// Moves the selection, settling digits held back in the section left.
    pub(crate) fn move_to(&self, selection: Selection) -> Transition<Self, DateTime<Tz>> {
        let leaving = self
            .typing
            .as_ref()
            .is_some_and(|typing| Selection::Section(typing.index) != selection);
        let (mut next, update) = if leaving {
            self.flush()
        } else {
            (self.clone(), None)
        };
        next.selection = selection;
        Transition::handled(next, update)
    }

    /// Selects the next section after a completed entry. The last section
    /// keeps the selection.
    fn advance_from(&mut self, idx: usize) {
        self.completed = Some(idx);
        if let Some(next) = self.sections[idx].next_editable_section {
            if next > idx {
                self.selection = Selection::Section(next);
            }
        }
    }

    fn step(&self, idx: usize, amount: i32) -> Transition<Self, DateTime<Tz>> {
        let rendered = &self.sections[idx];
        let Some((min, max)) = rendered.bounds() else {
            return Transition::unhandled(self.clone());
        };
        let display = self.display_naive();
        let seed = section_value(&rendered.section, &display).unwrap_or(min);
        let shown = step_value(rendered.value, seed, amount, min, max);

        let mut next = self.clone();
        next.typing = None;
        let (state, update) = next.with_section_value(idx, shown, true);
        Transition::handled(state, update)
    }

    fn jump_to_bound(&self, upper: bool) -> Transition<Self, DateTime<Tz>> {
        let Some(idx) = self.active() else {
            return Transition::unhandled(self.clone());
        };
        let Some((min, max)) = self.sections[idx].bounds() else {
            return Transition::unhandled(self.clone());
        };
        let mut next = self.clone();
        next.typing = None;
        let (state, update) = next.with_section_value(idx, if upper { max } else { min }, true);
        Transition::handled(state, update)
    }

    fn type_digit(&self, idx: usize, digit: char) -> Transition<Self, DateTime<Tz>> {
        let rendered = &self.sections[idx];
        let Some((min, max)) = rendered.bounds() else {
            return Transition::unhandled(self.clone());
        };
        let keys = self
            .typing
            .as_ref()
            .filter(|typing| typing.index == idx && typing.digits)
            .map_or("", |typing| typing.keys.as_str());

        let mut next = self.clone();
        match type_digit(keys, digit, rendered.max_length(), min, max) {
            None => {
                next.typing = None;
                next.render();
                Transition::handled(next, None)
            }
            Some(typed) if !typed.complete => {
                next.typing = Some(Typing {
                    index: idx,
                    keys: typed.keys,
                    digits: true,
                });
                next.render();
                Transition::handled(next, None)
            }
            Some(typed) => {
                next.typing = None;
                let (mut state, update) = next.with_section_value(idx, typed.value, false);
                state.advance_from(idx);
                Transition::handled(state, update)
            }
        }
    }

    fn type_letter(&self, idx: usize, letter: char) -> Transition<Self, DateTime<Tz>> {
        let section = &self.layout[idx];
        let Some(field) = section.field() else {
            return Transition::unhandled(self.clone());
        };
        let locale = self.options.locale;
        let (options, first): (Vec<&str>, i32) = match section.style {
            TokenStyle::Name(width) => (
                names(locale, field, width).to_vec(),
                i32::from(field == FieldKind::Month),
            ),
            TokenStyle::Meridiem { .. } => (locale.meridiem.to_vec(), 0),
            _ => return Transition::unhandled(self.clone()),
        };

        let keys = self
            .typing
            .as_ref()
            .filter(|typing| typing.index == idx && !typing.digits)
            .map_or("", |typing| typing.keys.as_str());
        let current = self.sections[idx]
            .value
            .and_then(|value| usize::try_from(value - first).ok());

        let Some(matched) = type_letter(keys, letter, &options, current) else {
            return Transition::unhandled(self.clone());
        };
        let Ok(index) = i32::try_from(matched.index) else {
            return Transition::unhandled(self.clone());
        };

        let mut next = self.clone();
        next.typing = if matched.unique {
            None
        } else {
            Some(Typing {
                index: idx,
                keys: matched.keys,
                digits: false,
            })
        };
        let (mut state, update) = next.with_section_value(idx, index + first, false);
        if matched.unique {
            state.advance_from(idx);
        }
        Transition::handled(state, update)
    }

    fn type_char(&self, ch: char) -> Transition<Self, DateTime<Tz>> {
        let Some(idx) = self.active() else {
            return Transition::unhandled(self.clone());
        };
        let section = &self.layout[idx];
        let is_meridiem = matches!(section.style, TokenStyle::Meridiem { .. });

        if ch.is_ascii_digit() && !is_meridiem {
            self.type_digit(idx, ch)
        } else if ch.is_alphabetic() && section.content_type == ContentType::Letter {
            self.type_letter(idx, ch)
        } else {
            Transition::unhandled(self.clone())
        }
    }

    fn clear_section(&self, idx: usize, backwards: bool) -> Transition<Self, DateTime<Tz>> {
        if let Some(typing) = self.typing.as_ref().filter(|t| t.index == idx && t.digits) {
            let mut next = self.clone();
            let mut keys = typing.keys.clone();
            if backwards {
                keys.pop();
            } else {
                keys.clear();
            }
            next.typing = if keys.is_empty() {
                None
            } else {
                Some(Typing {
                    index: idx,
                    keys,
                    digits: true,
                })
            };
            next.render();
            return Transition::handled(next, None);
        }

        let Some(field) = self.layout[idx].field() else {
            return Transition::unhandled(self.clone());
        };

        if self.sections[idx].value.is_none() {
            return match self.sections[idx].previous_editable_section {
                Some(previous) if backwards && previous < idx => {
                    self.move_to(Selection::Section(previous))
                }
                _ => Transition::unhandled(self.clone()),
            };
        }

        let mut working = self.working.clear(field);
        let mut valid = self.valid.without(field.storage());
        if field == FieldKind::Weekday && self.present.contains(FieldKind::Day) {
            working = working.clear(FieldKind::Day);
            valid = valid.without(FieldKind::Day);
        }

        let mut next = self.clone();
        next.typing = None;
        let (state, update) = next.settle(working, valid);
        Transition::handled(state, update)
    }

    fn clear_all(&self) -> Transition<Self, DateTime<Tz>> {
        let mut next = self.clone();
        next.typing = None;
        let (state, update) = next.settle(IncompleteValue::new(), FieldSet::EMPTY);
        Transition::handled(state, update)
    }

    fn handle_key(&self, key: Key) -> Transition<Self, DateTime<Tz>> {
        let active = self.active();
        match key {
            Key::ArrowUp | Key::ArrowDown | Key::PageUp | Key::PageDown => {
                let Some(idx) = active else {
                    return Transition::unhandled(self.clone());
                };
                let Some(field) = self.layout[idx].field() else {
                    return Transition::unhandled(self.clone());
                };
                let amount = match key {
                    Key::ArrowUp => 1,
                    Key::ArrowDown => -1,
                    Key::PageUp => field.page_step(),
                    _ => -field.page_step(),
                };
                self.step(idx, amount)
            }
            Key::Home | Key::End => {
                let target = if key == Key::Home {
                    self.first_editable()
                } else {
                    self.last_editable()
                };
                target.map_or_else(
                    || Transition::unhandled(self.clone()),
                    |idx| self.move_to(Selection::Section(idx)),
                )
            }
            Key::ArrowLeft | Key::ArrowRight => {
                let forward = key == Key::ArrowRight;
                let target = match self.selection {
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
                };
                target.map_or_else(
                    || Transition::unhandled(self.clone()),
                    |idx| self.move_to(Selection::Section(idx)),
                )
            }
            Key::Backspace | Key::Delete => match (self.selection, active) {
                (Selection::All, _) => self.clear_all(),
                (_, Some(idx)) => self.clear_section(idx, key == Key::Backspace),
                _ => Transition::unhandled(self.clone()),
            },
            Key::SelectAll => {
                let (mut next, update) = self.flush();
                next.selection = Selection::All;
                Transition::handled(next, update)
            }
            Key::Char(ch) => self.type_char(ch),
        }
    }

    /// Settles pending input when focus leaves the field.
    ///
    /// A complete entry that does not exist in the calendar (31 April) is
    /// clamped into range and committed; this is the only place an entry is
    /// corrected rather than held back.
    fn confirm(&self) -> Transition<Self, DateTime<Tz>> {
        let (mut next, mut update) = self.flush();
        next.selection = Selection::None;

        if next.value.is_none()
            && !next.required.is_empty()
            && next.valid.is_superset(next.required)
            && next.working.is_complete(next.required)
        {
            let naive = next.display_naive();
            if !next.working.validate(&naive, next.required) {
                tracing::debug!(value = %naive, "Clamping complete entry into a valid date");
                let clamped = IncompleteValue::from_date(&naive);
                let valid = next.valid;
                let (state, clamp_update) = next.settle(clamped, valid);
                next = state;
                update = clamp_update.or(update);
            }
        }

        Transition::handled(next, update)
    }

    fn paste(&self, text: &str) -> Transition<Self, DateTime<Tz>> {
        match self.parse(text) {
            Ok(parsed) => {
                let mut next = self.clone();
                next.typing = None;
                let working = IncompleteValue::from_date(&parsed.naive_local());
                let (state, update) = next.settle(working, self.present);
                Transition::handled(state, update)
            }
            Err(err) => {
                tracing::debug!(error = %err, "Rejected pasted text");
                Transition::unhandled(self.clone())
            }
        }
    }
}

impl SegmentedField for DateFieldState {
    type Value = DateTime<Tz>;

    fn sections(&self) -> &[EditableSection] {
        &self.sections
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn value(&self) -> Option<&DateTime<Tz>> {
        self.value.as_ref()
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn is_invalid(&self) -> bool {
        self.value.is_none()
            && !self.required.is_empty()
            && self.valid.is_superset(self.required)
            && self.working.is_complete(self.required)
    }

    fn apply(&self, event: FieldEvent) -> Transition<Self, DateTime<Tz>> {
        let mut current = self.clone();
        current.completed = None;

        match event {
            FieldEvent::Key(key) => current.handle_key(key),
            FieldEvent::Focus(idx) => {
                if current.sections.get(idx).is_some_and(|section| section.is_editable()) {
                    current.move_to(Selection::Section(idx))
                } else {
                    Transition::unhandled(current)
                }
            }
            FieldEvent::Blur => current.confirm(),
            FieldEvent::Paste(text) => current.paste(&text),
            FieldEvent::IncrementToMax => current.jump_to_bound(true),
            FieldEvent::DecrementToMin => current.jump_to_bound(false),
        }
    }

    fn with_value(&self, value: Option<DateTime<Tz>>) -> Self {
        let mut next = self.clone();
        next.typing = None;
        match value {
            Some(value) => {
                let value = value.with_timezone(&self.options.time_zone);
                next.value = Some(value);
                next.working = IncompleteValue::from_date(&value.naive_local());
                next.valid = self.present;
            }
            None => {
                next.value = None;
                next.working = IncompleteValue::new();
                next.valid = FieldSet::EMPTY;
                next.placeholder = self.options.placeholder_date();
            }
        }
        next.render();
        next
    }
}

/// Update callback of a [`DateField`].
pub type UpdateCallback<V> = Box<dyn FnMut(Option<&V>)>;

/// Mutable host for a field state.
///
/// An uncontrolled field keeps whatever the user commits. A controlled field
/// only reports commits; its value changes through [`DateField::set_value`].
pub struct DateField<F: SegmentedField> {
    state: F,
    initial: Option<F::Value>,
    controlled: bool,
    on_update: Option<UpdateCallback<F::Value>>,
}

impl<F: SegmentedField + fmt::Debug> fmt::Debug for DateField<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateField")
            .field("state", &self.state)
            .field("controlled", &self.controlled)
            .field("on_update", &self.on_update.is_some())
            .finish_non_exhaustive()
    }
}

impl<F: SegmentedField> DateField<F> {
    pub fn new(state: F) -> Self {
        Self {
            initial: state.value().cloned(),
            state,
            controlled: false,
            on_update: None,
        }
    }

    pub fn controlled(state: F) -> Self {
        Self {
            controlled: true,
            ..Self::new(state)
        }
    }

    #[must_use]
    pub fn on_update(mut self, callback: impl FnMut(Option<&F::Value>) + 'static) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    pub const fn state(&self) -> &F {
        &self.state
    }

    pub fn value(&self) -> Option<&F::Value> {
        self.state.value()
    }

    pub fn text(&self) -> String {
        self.state.text()
    }

    /// Applies one event. Returns whether it was handled.
    pub fn dispatch(&mut self, event: FieldEvent) -> bool {
        let Transition {
            state,
            update,
            handled,
        } = self.state.apply(event);
        self.state = state;

        if let Some(update) = update {
            self.notify(update.value());
            if self.controlled {
                self.state = self.state.with_value(self.initial.clone());
            }
        }
        handled
    }

    /// Replaces the value from outside. For a controlled field this is the
    /// only way the committed value changes.
    pub fn set_value(&mut self, value: Option<F::Value>) {
        self.state = self.state.with_value(value.clone());
        self.initial = value;
    }

    /// Restores the last value supplied from outside.
    pub fn reset(&mut self) {
        let changed = self.state.value() != self.initial.as_ref();
        self.state = self.state.with_value(self.initial.clone());
        if changed {
            let value = self.initial.clone();
            self.notify(value.as_ref());
        }
    }

    fn notify(&mut self, value: Option<&F::Value>) {
        if let Some(callback) = self.on_update.as_mut() {
            callback(value);
        }
    }
}
