//! Format-string tokenizer.
//!
//! A display format such as `DD.MM.YYYY HH:mm` is turned into an ordered list
//! of [`Section`]s: typed fields and the literal text between them. Locale
//! long-form tokens (`L`, `LLL`, `LT`, ...) are expanded first, `[...]` escapes
//! force their contents to be literal, and unknown letter tokens degrade to
//! literal text with a warning.

use std::collections::HashSet;

use serde::Serialize;

use crate::format::render_value;
use crate::locale::{Locale, NameWidth};
use crate::types::{ContentType, FieldKind, FieldSet, SectionKind};

/// Longest token in the table; letter runs are split greedily up to this length.
const MAX_TOKEN_LEN: usize = 4;

/// Long-form tokens in match priority order.
const LONG_FORM_TOKENS: [&str; 10] = [
    "LTS", "LT", "LLLL", "LLL", "LL", "L", "llll", "lll", "ll", "l",
];

/// How a token renders its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStyle {
    /// Plain number, zero-padded to `pad` digits
    Numeric { pad: usize },
    /// `YY`: last two digits of the year
    TwoDigitYear,
    /// `Do`: day of month with the locale's ordinal suffix
    Ordinal,
    /// `h`/`hh`: hour on a 12-hour clock
    Hour12 { pad: usize },
    /// Month or weekday name
    Name(NameWidth),
    /// `A`/`a`
    Meridiem { upper: bool },
    /// `z`
    ZoneAbbreviation,
    /// `Z` (`+03:00`) and `ZZ` (`+0300`)
    ZoneOffset { colon: bool },
    Literal,
}

/// One lexical unit of a format string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub kind: SectionKind,
    /// The token (`DD`, `MMMM`, ...) or, for literals, the literal text.
    pub format_token: String,
    pub content_type: ContentType,
    pub placeholder: String,
    pub has_leading_zeros: bool,
    #[serde(skip)]
    pub(crate) style: TokenStyle,
}

impl Section {
    pub(crate) fn literal(text: String) -> Self {
        Self {
            kind: SectionKind::Literal,
            placeholder: text.clone(),
            format_token: text,
            content_type: ContentType::Letter,
            has_leading_zeros: false,
            style: TokenStyle::Literal,
        }
    }

    fn token(
        token: &str,
        kind: SectionKind,
        content_type: ContentType,
        style: TokenStyle,
        locale: &Locale,
    ) -> Self {
        let mut section = Self {
            kind,
            format_token: token.to_owned(),
            content_type,
            placeholder: String::new(),
            has_leading_zeros: false,
            style,
        };
        if let Some(field) = kind.field() {
            section.has_leading_zeros = content_type == ContentType::Digit && {
                let sample = render_value(style, field, 1, locale);
                sample.len() > 1 && sample.starts_with('0')
            };
            section.placeholder = section.placeholder_text(field, locale);
        }
        section
    }

    fn placeholder_text(&self, field: FieldKind, locale: &Locale) -> String {
        if field == FieldKind::DayPeriod {
            return locale.placeholders.day_period.to_owned();
        }
        let width = match self.content_type {
            ContentType::Digit => self.max_length(),
            ContentType::Letter => self.format_token.chars().count(),
        };
        std::iter::repeat_n(locale.placeholder_char(field), width).collect()
    }

    pub const fn field(&self) -> Option<FieldKind> {
        self.kind.field()
    }

    pub const fn is_editable(&self) -> bool {
        self.kind.is_editable()
    }

    pub const fn is_hour12(&self) -> bool {
        matches!(self.style, TokenStyle::Hour12 { .. })
    }

    pub const fn is_two_digit_year(&self) -> bool {
        matches!(self.style, TokenStyle::TwoDigitYear)
    }

    /// Most digits a user can type into this section.
    pub fn max_length(&self) -> usize {
        let Some(field) = self.field() else {
            return self.format_token.chars().count();
        };
        match (field, self.style) {
            (FieldKind::Year, TokenStyle::TwoDigitYear) => 2,
            (FieldKind::Year, _) => 4,
            (FieldKind::Quarter | FieldKind::Weekday | FieldKind::DayPeriod, _) => 1,
            _ => 2,
        }
    }

    /// Bounds that do not depend on the rest of the value.
    /// The day's upper bound is refined by the materializer.
    pub fn static_bounds(&self) -> Option<(i32, i32)> {
        use crate::consts::{
            MAX_DAYS_IN_MONTH, MAX_HOUR, MAX_MINUTE, MAX_MONTH, MAX_QUARTER, MAX_SECOND,
            MAX_YEAR, MIN_DAY, MIN_YEAR,
        };
        let Some(field) = self.field() else {
            return None;
        };
        Some(match field {
            FieldKind::Year => {
                if self.is_two_digit_year() {
                    (0, 99)
                } else {
                    (MIN_YEAR, MAX_YEAR)
                }
            }
            FieldKind::Quarter => (1, MAX_QUARTER),
            FieldKind::Month => (1, MAX_MONTH),
            FieldKind::Weekday => (0, 6),
            FieldKind::Day => (MIN_DAY, MAX_DAYS_IN_MONTH),
            FieldKind::DayPeriod => (0, 1),
            FieldKind::Hour => {
                if self.is_hour12() {
                    (1, 12)
                } else {
                    (0, MAX_HOUR)
                }
            }
            FieldKind::Minute => (0, MAX_MINUTE),
            FieldKind::Second => (0, MAX_SECOND),
        })
    }
}

fn lookup(token: &str) -> Option<(SectionKind, ContentType, TokenStyle)> {
    use ContentType::{Digit, Letter};
    use FieldKind as F;
    use TokenStyle as S;

    let field = SectionKind::Field;
    Some(match token {
        "YYYY" => (field(F::Year), Digit, S::Numeric { pad: 4 }),
        "YY" => (field(F::Year), Digit, S::TwoDigitYear),
        "Q" => (field(F::Quarter), Digit, S::Numeric { pad: 1 }),
        "M" => (field(F::Month), Digit, S::Numeric { pad: 1 }),
        "MM" => (field(F::Month), Digit, S::Numeric { pad: 2 }),
        "MMM" => (field(F::Month), Letter, S::Name(NameWidth::Short)),
        "MMMM" => (field(F::Month), Letter, S::Name(NameWidth::Long)),
        "D" => (field(F::Day), Digit, S::Numeric { pad: 1 }),
        "DD" => (field(F::Day), Digit, S::Numeric { pad: 2 }),
        "Do" => (field(F::Day), Digit, S::Ordinal),
        "d" => (field(F::Weekday), Digit, S::Numeric { pad: 1 }),
        "dd" => (field(F::Weekday), Letter, S::Name(NameWidth::Min)),
        "ddd" => (field(F::Weekday), Letter, S::Name(NameWidth::Short)),
        "dddd" => (field(F::Weekday), Letter, S::Name(NameWidth::Long)),
        "A" => (field(F::DayPeriod), Letter, S::Meridiem { upper: true }),
        "a" => (field(F::DayPeriod), Letter, S::Meridiem { upper: false }),
        "H" => (field(F::Hour), Digit, S::Numeric { pad: 1 }),
        "HH" => (field(F::Hour), Digit, S::Numeric { pad: 2 }),
        "h" => (field(F::Hour), Digit, S::Hour12 { pad: 1 }),
        "hh" => (field(F::Hour), Digit, S::Hour12 { pad: 2 }),
        "m" => (field(F::Minute), Digit, S::Numeric { pad: 1 }),
        "mm" => (field(F::Minute), Digit, S::Numeric { pad: 2 }),
        "s" => (field(F::Second), Digit, S::Numeric { pad: 1 }),
        "ss" => (field(F::Second), Digit, S::Numeric { pad: 2 }),
        "z" => (SectionKind::TimeZoneName, Letter, S::ZoneAbbreviation),
        "Z" => (SectionKind::TimeZoneName, Letter, S::ZoneOffset { colon: true }),
        "ZZ" => (SectionKind::TimeZoneName, Letter, S::ZoneOffset { colon: false }),
        _ => return None,
    })
}

/// Replaces locale long-form tokens with the patterns they stand for.
/// Bracket-escaped text is copied through untouched.
pub fn expand_long_formats(format: &str, locale: &Locale) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            let end = rest.find(']').map_or(rest.len(), |idx| idx + 1);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        if ch == 'L' || ch == 'l' {
            let expansion = LONG_FORM_TOKENS.iter().find_map(|token| {
                rest.starts_with(token)
                    .then(|| locale.long_format(token).map(|pattern| (token.len(), pattern)))
                    .flatten()
            });
            if let Some((consumed, pattern)) = expansion {
                out.push_str(pattern);
                rest = &rest[consumed..];
                continue;
            }
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Splits a run of letters into known tokens, longest match first.
/// Characters that start no known token are returned as `Err` pieces.
fn split_letter_run(run: &[char]) -> Vec<Result<String, String>> {
    let mut pieces: Vec<Result<String, String>> = Vec::new();
    let mut idx = 0usize;

    while idx < run.len() {
        let longest = (1..=MAX_TOKEN_LEN.min(run.len() - idx))
            .rev()
            .map(|len| run[idx..idx + len].iter().collect::<String>())
            .find(|candidate| lookup(candidate).is_some());

        match longest {
            Some(token) => {
                idx += token.chars().count();
                pieces.push(Ok(token));
            }
            None => {
                if let Some(Err(unknown)) = pieces.last_mut() {
                    unknown.push(run[idx]);
                } else {
                    pieces.push(Err(run[idx].to_string()));
                }
                idx += 1;
            }
        }
    }

    pieces
}

/// Tokenizes a display format into sections.
///
/// Consecutive literal text (escaped or not) is merged into one literal
/// section. Unsupported letter tokens become literal text and are reported
/// once per call.
pub fn tokenize(format: &str, locale: &Locale) -> Vec<Section> {
    let expanded = expand_long_formats(format, locale);
    let chars: Vec<char> = expanded.chars().collect();

    let mut sections = Vec::new();
    let mut literal = String::new();
    let mut reported = HashSet::new();
    let mut idx = 0usize;

    while idx < chars.len() {
        let ch = chars[idx];

        if ch == '[' {
            let close = chars[idx + 1..]
                .iter()
                .position(|c| *c == ']')
                .map_or(chars.len(), |offset| idx + 1 + offset);
            literal.extend(&chars[idx + 1..close]);
            idx = (close + 1).min(chars.len());
            continue;
        }

        if !ch.is_alphabetic() {
            literal.push(ch);
            idx += 1;
            continue;
        }

        let start = idx;
        while idx < chars.len() && chars[idx].is_alphabetic() {
            idx += 1;
        }

        for piece in split_letter_run(&chars[start..idx]) {
            match piece {
                Ok(token) => {
                    let Some((kind, content, style)) = lookup(&token) else {
                        continue;
                    };
                    if !literal.is_empty() {
                        sections.push(Section::literal(std::mem::take(&mut literal)));
                    }
                    sections.push(Section::token(&token, kind, content, style, locale));
                }
                Err(unknown) => {
                    if reported.insert(unknown.clone()) {
                        tracing::warn!(
                            token = %unknown,
                            format = %format,
                            "Unsupported format token, rendering it as literal text"
                        );
                    }
                    literal.push_str(&unknown);
                }
            }
        }
    }

    if !literal.is_empty() {
        sections.push(Section::literal(literal));
    }

    sections
}

/// Fields that must be confirmed before a value built from `sections` can be
/// committed.
///
/// A quarter section is backed by the month. The weekday is derived when the
/// format also has a day.
pub fn required_fields(sections: &[Section]) -> FieldSet {
    let present: FieldSet = sections.iter().filter_map(Section::field).collect();

    present.iter().fold(FieldSet::EMPTY, |required, field| match field {
        FieldKind::Weekday if present.contains(FieldKind::Day) => required,
        other => required.with(other.storage()),
    })
}

/// Finest unit among the editable sections, if there is any.
pub fn finest_field(sections: &[Section]) -> Option<FieldKind> {
    sections
        .iter()
        .filter_map(Section::field)
        .max_by_key(|field| field.precision())
}
