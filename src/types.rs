use crate::consts::{
    CENTURY_CYCLE, DAYS_IN_MONTH, FEBRUARY, FEBRUARY_DAYS_LEAP, GREGORIAN_CYCLE, LEAP_YEAR_CYCLE,
    MAX_DAYS_IN_MONTH, MAX_MONTH,
};
use crate::prelude::*;
use serde::{Deserialize, Serialize};

/// One editable component of a date/time value.
///
/// `Quarter` has no storage of its own: it reads and writes the month.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    #[display(fmt = "year")]
    Year,
    #[display(fmt = "quarter")]
    Quarter,
    #[display(fmt = "month")]
    Month,
    #[display(fmt = "weekday")]
    Weekday,
    #[display(fmt = "day")]
    Day,
    #[display(fmt = "dayPeriod")]
    DayPeriod,
    #[display(fmt = "hour")]
    Hour,
    #[display(fmt = "minute")]
    Minute,
    #[display(fmt = "second")]
    Second,
}

impl FieldKind {
    pub const ALL: [Self; 9] = [
        Self::Year,
        Self::Quarter,
        Self::Month,
        Self::Weekday,
        Self::Day,
        Self::DayPeriod,
        Self::Hour,
        Self::Minute,
        Self::Second,
    ];

    /// Step used by PageUp/PageDown.
    pub const fn page_step(self) -> i32 {
        match self {
            Self::Year => 10,
            Self::Quarter | Self::Hour => 2,
            Self::Month | Self::Weekday => 3,
            Self::Day => 7,
            Self::Minute | Self::Second => 15,
            Self::DayPeriod => 1,
        }
    }

    /// The field whose storage backs this one.
    pub const fn storage(self) -> Self {
        match self {
            Self::Quarter => Self::Month,
            other => other,
        }
    }

    /// Granularity of the field, used to find the finest unit of a format.
    /// Larger is finer.
    pub(crate) const fn precision(self) -> u8 {
        match self {
            Self::Year => 0,
            Self::Quarter => 1,
            Self::Month => 2,
            Self::Weekday | Self::Day => 3,
            Self::DayPeriod | Self::Hour => 4,
            Self::Minute => 5,
            Self::Second => 6,
        }
    }
}

/// What a tokenized section of a format string represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "field")]
pub enum SectionKind {
    #[display(fmt = "{_0}")]
    Field(FieldKind),
    /// Zone abbreviation or offset; displayed, never edited.
    #[display(fmt = "timeZoneName")]
    TimeZoneName,
    #[display(fmt = "literal")]
    Literal,
}

impl SectionKind {
    pub const fn field(self) -> Option<FieldKind> {
        match self {
            Self::Field(field) => Some(field),
            Self::TimeZoneName | Self::Literal => None,
        }
    }

    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Field(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    Digit,
    Letter,
}

/// A small set of [`FieldKind`]s, copied by value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(u16);

impl FieldSet {
    pub const EMPTY: Self = Self(0);

    const fn bit(field: FieldKind) -> u16 {
        1 << field as u16
    }

    #[must_use]
    pub const fn with(self, field: FieldKind) -> Self {
        Self(self.0 | Self::bit(field))
    }

    #[must_use]
    pub const fn without(self, field: FieldKind) -> Self {
        Self(self.0 & !Self::bit(field))
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, field: FieldKind) -> bool {
        self.0 & Self::bit(field) != 0
    }

    pub const fn is_superset(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = FieldKind> {
        FieldKind::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }
}

impl FromIterator<FieldKind> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

// Helper functions

pub const fn is_leap_year(year: i32) -> bool {
    (year % LEAP_YEAR_CYCLE == 0 && year % CENTURY_CYCLE != 0) || (year % GREGORIAN_CYCLE == 0)
}

/// Days in `month` of `year`. Out-of-range months count as the longest month.
pub const fn days_in_month(year: i32, month: i32) -> i32 {
    if month < 1 || month > MAX_MONTH {
        return MAX_DAYS_IN_MONTH;
    }
    if month == FEBRUARY && is_leap_year(year) {
        FEBRUARY_DAYS_LEAP
    } else {
        DAYS_IN_MONTH[month as usize]
    }
}

/// Day count of the month that contains `date`.
pub fn days_in_month_of(date: NaiveDate) -> i32 {
    days_in_month(date.year(), date.month() as i32)
}
