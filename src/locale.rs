//! Locale data consumed by the tokenizer and the formatter.
//!
//! A locale supplies three things: the long-form format table (`L`, `LT`, ...),
//! the names shown by letter sections, and the filler characters used for
//! sections that have no value yet.

use crate::consts::DAY_PERIOD_PLACEHOLDER;
use crate::types::FieldKind;

/// Width of a month or weekday name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameWidth {
    /// Two-letter weekday abbreviation (`dd`)
    Min,
    /// `MMM` / `ddd`
    Short,
    /// `MMMM` / `dddd`
    Long,
}

/// Filler characters shown in place of a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholders {
    pub year: char,
    pub quarter: char,
    pub month: char,
    pub weekday: char,
    pub day: char,
    pub hour: char,
    pub minute: char,
    pub second: char,
    pub day_period: &'static str,
}

#[derive(Debug)]
pub struct Locale {
    pub code: &'static str,
    pub months: [&'static str; 12],
    pub months_short: [&'static str; 12],
    pub weekdays: [&'static str; 7],
    pub weekdays_short: [&'static str; 7],
    pub weekdays_min: [&'static str; 7],
    /// Upper-case AM/PM labels, index 0 is AM
    pub meridiem: [&'static str; 2],
    pub long_formats: &'static [(&'static str, &'static str)],
    pub placeholders: Placeholders,
    ordinal: fn(i32) -> String,
}

impl Locale {
    /// Looks up a built-in locale by its code (`"en"`, `"ru"`).
    /// Region subtags are ignored, so `"en-GB"` resolves to `en`.
    pub fn from_code(code: &str) -> Option<&'static Self> {
        let language = code.split(['-', '_']).next().unwrap_or(code);
        BUILT_IN
            .iter()
            .copied()
            .find(|locale| locale.code.eq_ignore_ascii_case(language))
    }

    /// Pattern a long-form token (`L`, `LLL`, `LT`, ...) stands for.
    pub fn long_format(&self, token: &str) -> Option<&'static str> {
        self.long_formats
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, pattern)| *pattern)
    }

    pub fn ordinal(&self, n: i32) -> String {
        (self.ordinal)(n)
    }

    pub const fn month_names(&self, width: NameWidth) -> &[&'static str] {
        match width {
            NameWidth::Min | NameWidth::Short => &self.months_short,
            NameWidth::Long => &self.months,
        }
    }

    pub const fn weekday_names(&self, width: NameWidth) -> &[&'static str] {
        match width {
            NameWidth::Min => &self.weekdays_min,
            NameWidth::Short => &self.weekdays_short,
            NameWidth::Long => &self.weekdays,
        }
    }

    pub fn meridiem_label(&self, period: i32, upper: bool) -> String {
        let label = self
            .meridiem
            .get(usize::try_from(period).unwrap_or(0))
            .copied()
            .unwrap_or(self.meridiem[0]);
        if upper {
            label.to_owned()
        } else {
            label.to_lowercase()
        }
    }

    /// Filler text for one character of an empty section.
    pub const fn placeholder_char(&self, field: FieldKind) -> char {
        let p = &self.placeholders;
        match field {
            FieldKind::Year => p.year,
            FieldKind::Quarter => p.quarter,
            FieldKind::Month => p.month,
            FieldKind::Weekday => p.weekday,
            FieldKind::Day => p.day,
            // Day periods use `day_period`; this is only a fallback.
            FieldKind::DayPeriod => '-',
            FieldKind::Hour => p.hour,
            FieldKind::Minute => p.minute,
            FieldKind::Second => p.second,
        }
    }
}

fn english_ordinal(n: i32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn russian_ordinal(n: i32) -> String {
    format!("{n}-го")
}

pub static EN: Locale = Locale {
    code: "en",
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    months_short: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    weekdays: [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ],
    weekdays_short: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    weekdays_min: ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
    meridiem: ["AM", "PM"],
    long_formats: &[
        ("LT", "h:mm A"),
        ("LTS", "h:mm:ss A"),
        ("L", "MM/DD/YYYY"),
        ("LL", "MMMM D, YYYY"),
        ("LLL", "MMMM D, YYYY h:mm A"),
        ("LLLL", "dddd, MMMM D, YYYY h:mm A"),
        ("l", "M/D/YYYY"),
        ("ll", "MMM D, YYYY"),
        ("lll", "MMM D, YYYY h:mm A"),
        ("llll", "ddd, MMM D, YYYY h:mm A"),
    ],
    placeholders: Placeholders {
        year: 'Y',
        quarter: 'Q',
        month: 'M',
        weekday: 'E',
        day: 'D',
        hour: 'h',
        minute: 'm',
        second: 's',
        day_period: DAY_PERIOD_PLACEHOLDER,
    },
    ordinal: english_ordinal,
};

pub static RU: Locale = Locale {
    code: "ru",
    months: [
        "января",
        "февраля",
        "марта",
        "апреля",
        "мая",
        "июня",
        "июля",
        "августа",
        "сентября",
        "октября",
        "ноября",
        "декабря",
    ],
    months_short: [
        "янв.", "февр.", "мар.", "апр.", "мая", "июня", "июля", "авг.", "сент.", "окт.", "нояб.",
        "дек.",
    ],
    weekdays: [
        "воскресенье",
        "понедельник",
        "вторник",
        "среда",
        "четверг",
        "пятница",
        "суббота",
    ],
    weekdays_short: ["вс", "пн", "вт", "ср", "чт", "пт", "сб"],
    weekdays_min: ["вс", "пн", "вт", "ср", "чт", "пт", "сб"],
    meridiem: ["AM", "PM"],
    long_formats: &[
        ("LT", "H:mm"),
        ("LTS", "H:mm:ss"),
        ("L", "DD.MM.YYYY"),
        ("LL", "D MMMM YYYY [г.]"),
        ("LLL", "D MMMM YYYY [г.], H:mm"),
        ("LLLL", "dddd, D MMMM YYYY [г.], H:mm"),
        ("l", "DD.MM.YYYY"),
        ("ll", "D MMM YYYY [г.]"),
        ("lll", "D MMM YYYY [г.], H:mm"),
        ("llll", "ddd, D MMM YYYY [г.], H:mm"),
    ],
    placeholders: Placeholders {
        year: 'Г',
        quarter: 'К',
        month: 'М',
        weekday: 'Н',
        day: 'Д',
        hour: 'ч',
        minute: 'м',
        second: 'с',
        day_period: DAY_PERIOD_PLACEHOLDER,
    },
    ordinal: russian_ordinal,
};

static BUILT_IN: [&Locale; 2] = [&EN, &RU];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Locale::from_code("en").map(|l| l.code), Some("en"));
        assert_eq!(Locale::from_code("RU").map(|l| l.code), Some("ru"));
        assert_eq!(Locale::from_code("en-GB").map(|l| l.code), Some("en"));
        assert!(Locale::from_code("xx").is_none());
    }

    #[test]
    fn test_long_format_lookup() {
        assert_eq!(EN.long_format("L"), Some("MM/DD/YYYY"));
        assert_eq!(RU.long_format("L"), Some("DD.MM.YYYY"));
        assert_eq!(EN.long_format("LTS"), Some("h:mm:ss A"));
        assert_eq!(EN.long_format("LLLLL"), None);
    }

    #[test]
    fn test_english_ordinals() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (31, "31st"),
        ];
        for (n, expected) in cases {
            assert_eq!(EN.ordinal(n), expected, "ordinal of {n}");
        }
    }

    #[test]
    fn test_meridiem_label_case() {
        assert_eq!(EN.meridiem_label(0, true), "AM");
        assert_eq!(EN.meridiem_label(1, false), "pm");
    }

    #[test]
    fn test_name_tables() {
        assert_eq!(EN.month_names(NameWidth::Long)[3], "April");
        assert_eq!(EN.month_names(NameWidth::Short)[3], "Apr");
        assert_eq!(EN.weekday_names(NameWidth::Min)[0], "Su");
        assert_eq!(RU.weekday_names(NameWidth::Long)[1], "понедельник");
    }
}
