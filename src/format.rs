//! Rendering and parsing of whole values through tokenized sections.
//!
//! Formatting a committed value with a list of sections and parsing that exact
//! text back with the same sections reproduces the value, down to the
//! precision the format can represent.

use chrono::{DateTime, Offset, SecondsFormat, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::consts::{AM, HOURS_PER_PERIOD};
use crate::locale::{Locale, NameWidth};
use crate::prelude::*;
use crate::tokenizer::{Section, TokenStyle, required_fields};
use crate::types::FieldKind;
use crate::{DateParts, IncompleteValue, ParseError, component};

/// Renders a section's display value (a 12-hour hour, a two-digit year, ...)
/// in the given token style.
pub(crate) fn render_value(
    style: TokenStyle,
    field: FieldKind,
    value: i32,
    locale: &Locale,
) -> String {
    match style {
        TokenStyle::Numeric { pad } | TokenStyle::Hour12 { pad } => format!("{value:0pad$}"),
        TokenStyle::TwoDigitYear => format!("{:02}", value.rem_euclid(100)),
        TokenStyle::Ordinal => locale.ordinal(value),
        TokenStyle::Name(width) => name_index(field, value)
            .and_then(|idx| names(locale, field, width).get(idx))
            .map(|name| (*name).to_owned())
            .unwrap_or_default(),
        TokenStyle::Meridiem { upper } => locale.meridiem_label(value, upper),
        TokenStyle::ZoneAbbreviation | TokenStyle::ZoneOffset { .. } | TokenStyle::Literal => {
            String::new()
        }
    }
}

/// Names a letter section chooses from, indexed like [`name_index`].
pub(crate) fn names(locale: &Locale, field: FieldKind, width: NameWidth) -> &[&'static str] {
    match field {
        FieldKind::Month => locale.month_names(width),
        FieldKind::Weekday => locale.weekday_names(width),
        _ => &[],
    }
}

/// Position of `value` in the name table of `field`.
const fn name_index(field: FieldKind, value: i32) -> Option<usize> {
    let idx = match field {
        FieldKind::Month => value - 1,
        _ => value,
    };
    if idx < 0 { None } else { Some(idx as usize) }
}

const fn to_hour12(hour: i32) -> i32 {
    match hour % HOURS_PER_PERIOD {
        0 => HOURS_PER_PERIOD,
        h => h,
    }
}

/// Converts a stored component into what the section displays.
pub(crate) const fn display_value(section: &Section, stored: i32) -> i32 {
    match section.style {
        TokenStyle::Hour12 { .. } => to_hour12(stored),
        TokenStyle::TwoDigitYear => stored.rem_euclid(100),
        _ => stored,
    }
}

/// Display value of `section` for a concrete date.
pub(crate) fn section_value(section: &Section, date: &NaiveDateTime) -> Option<i32> {
    let field = section.field()?;
    Some(display_value(section, component(date, field)))
}

/// Year for a two-digit entry, placed in the century of `base_year`.
pub(crate) const fn pivot_year(two_digits: i32, base_year: i32) -> i32 {
    base_year - base_year.rem_euclid(100) + two_digits
}

fn render_section(section: &Section, value: &DateTime<Tz>, locale: &Locale) -> String {
    match section.style {
        TokenStyle::Literal => section.format_token.clone(),
        TokenStyle::ZoneAbbreviation => value.format("%Z").to_string(),
        TokenStyle::ZoneOffset { colon: true } => value.format("%:z").to_string(),
        TokenStyle::ZoneOffset { colon: false } => value.format("%z").to_string(),
        style => section
            .field()
            .and_then(|field| {
                section_value(section, &value.naive_local())
                    .map(|shown| render_value(style, field, shown, locale))
            })
            .unwrap_or_default(),
    }
}

/// Formats `value` in its own zone through `sections`.
pub fn format_date(sections: &[Section], value: &DateTime<Tz>, locale: &Locale) -> String {
    sections
        .iter()
        .map(|section| render_section(section, value, locale))
        .collect()
}

/// Parses text produced by [`format_date`] with the same sections.
///
/// Components the format does not carry are taken from `base`; a two-digit
/// year lands in `base`'s century.
pub fn parse_date(
    sections: &[Section],
    text: &str,
    locale: &Locale,
    tz: Tz,
    base: NaiveDateTime,
) -> Result<DateTime<Tz>, ParseError> {
    let value = parse_fields(sections, text, locale, base.year())?;
    let required = required_fields(sections);
    if !value.is_complete(required) {
        return Err(ParseError::Incomplete);
    }

    let naive = value.to_date(base, DateParts::ALL);
    if !value.validate(&naive, required) {
        return Err(ParseError::NonexistentDate(text.trim().to_owned()));
    }
    Ok(resolve_local(tz, naive))
}

/// Reads every field of `text` into an incomplete value.
pub(crate) fn parse_fields(
    sections: &[Section],
    text: &str,
    locale: &Locale,
    base_year: i32,
) -> Result<IncompleteValue, ParseError> {
    let input = text.trim();
    if input.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut rest = input;
    let mut value = IncompleteValue::new();
    let mut hour12 = None;

    for section in sections {
        let offset = input.len() - rest.len();
        match section.style {
            TokenStyle::Literal => {
                rest = rest.strip_prefix(section.format_token.as_str()).ok_or_else(|| {
                    ParseError::LiteralMismatch {
                        expected: section.format_token.clone(),
                        offset,
                    }
                })?;
            }
            TokenStyle::ZoneAbbreviation | TokenStyle::ZoneOffset { .. } => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | ':')))
                    .unwrap_or(rest.len());
                rest = &rest[end..];
            }
            style => {
                let Some(field) = section.field() else {
                    continue;
                };
                let (number, consumed) =
                    read_section(section, field, rest, locale).ok_or_else(|| {
                        ParseError::InvalidField {
                            field,
                            text: rest.chars().take(section.max_length()).collect(),
                            offset,
                        }
                    })?;
                rest = &rest[consumed..];
                value = match style {
                    TokenStyle::Hour12 { .. } => {
                        hour12 = Some(number);
                        value
                    }
                    TokenStyle::TwoDigitYear => {
                        value.set(FieldKind::Year, pivot_year(number, base_year))
                    }
                    _ => value.set(field, number),
                };
            }
        }
    }

    if !rest.is_empty() {
        return Err(ParseError::TrailingInput(rest.to_owned()));
    }

    if let Some(hour) = hour12 {
        let period = value.get(FieldKind::DayPeriod).unwrap_or(AM);
        value = value.set(FieldKind::Hour, hour % HOURS_PER_PERIOD + HOURS_PER_PERIOD * period);
    }
    Ok(value)
}

/// Reads one field at the start of `input`. Returns the display value and the
/// number of bytes consumed.
fn read_section(
    section: &Section,
    field: FieldKind,
    input: &str,
    locale: &Locale,
) -> Option<(i32, usize)> {
    let (number, consumed) = match section.style {
        TokenStyle::Name(width) => {
            let (idx, consumed) = match_name(names(locale, field, width), input)?;
            let idx = i32::try_from(idx).ok()?;
            let number = if field == FieldKind::Month { idx + 1 } else { idx };
            (number, consumed)
        }
        TokenStyle::Meridiem { .. } => {
            let labels = [locale.meridiem[0], locale.meridiem[1]];
            let (idx, consumed) = match_name(&labels, input)?;
            (i32::try_from(idx).ok()?, consumed)
        }
        TokenStyle::Ordinal => {
            let (number, digits) = read_digits(input, section.max_length())?;
            let rendered = locale.ordinal(number);
            let suffix = rendered.trim_start_matches(|c: char| c.is_ascii_digit());
            input[digits..].strip_prefix(suffix)?;
            (number, digits + suffix.len())
        }
        _ => read_digits(input, section.max_length())?,
    };

    let (min, max) = section.static_bounds()?;
    (min..=max).contains(&number).then_some((number, consumed))
}

fn read_digits(input: &str, max_len: usize) -> Option<(i32, usize)> {
    let len = input
        .bytes()
        .take(max_len)
        .take_while(u8::is_ascii_digit)
        .count();
    if len == 0 {
        return None;
    }
    input[..len].parse().ok().map(|number| (number, len))
}

/// Longest case-insensitive match of any of `options` at the start of `input`.
fn match_name(options: &[&str], input: &str) -> Option<(usize, usize)> {
    options
        .iter()
        .enumerate()
        .filter_map(|(idx, option)| {
            let chars = option.chars().count();
            let consumed = input
                .char_indices()
                .nth(chars)
                .map_or(input.len(), |(pos, _)| pos);
            let candidate = &input[..consumed];
            (candidate.chars().count() == chars
                && candidate.to_lowercase() == option.to_lowercase())
            .then_some((idx, consumed))
        })
        .max_by_key(|(_, consumed)| *consumed)
}

/// Parses an ISO 8601 instant, or a zone-less date/date-time in `tz`.
pub fn parse_iso(text: &str, tz: Tz) -> Result<DateTime<Tz>, ParseError> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&tz));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
            return Ok(resolve_local(tz, naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(resolve_local(tz, date.and_time(NaiveTime::MIN)));
    }
    Err(ParseError::InvalidIso(text.to_owned()))
}

/// Stable form-field representation: UTC, millisecond precision, `Z` suffix.
pub fn to_iso(value: &DateTime<Tz>) -> String {
    value
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Places a wall-clock time in `tz`.
///
/// An ambiguous time (clocks turned back) takes the earlier instant. A time
/// inside a gap (clocks turned forward) keeps the offset in force before the
/// gap, which moves it forward by the gap's length.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    if let Some(resolved) = tz.from_local_datetime(&naive).earliest() {
        return resolved;
    }
    let offset_before = naive
        .checked_sub_signed(TimeDelta::days(1))
        .and_then(|earlier| tz.from_local_datetime(&earlier).earliest())
        .map_or(0, |earlier| earlier.offset().fix().local_minus_utc());
    let utc = naive
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset_before)))
        .unwrap_or(naive);
    tz.from_utc_datetime(&utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{EN, RU};
    use crate::test_utils::{berlin, naive, utc};
    use crate::tokenizer::tokenize;

    #[test]
    fn test_render_value_styles() {
        struct TestCase {
            format: &'static str,
            value: i32,
            expected: &'static str,
        }

        let cases = [
            TestCase {
                format: "DD",
                value: 5,
                expected: "05",
            },
            TestCase {
                format: "D",
                value: 5,
                expected: "5",
            },
            TestCase {
                format: "Do",
                value: 22,
                expected: "22nd",
            },
            TestCase {
                format: "MMMM",
                value: 4,
                expected: "April",
            },
            TestCase {
                format: "MMM",
                value: 12,
                expected: "Dec",
            },
            TestCase {
                format: "dd",
                value: 0,
                expected: "Su",
            },
            TestCase {
                format: "YY",
                value: 7,
                expected: "07",
            },
            TestCase {
                format: "a",
                value: 1,
                expected: "pm",
            },
        ];

        for case in &cases {
            let section = &tokenize(case.format, &EN)[0];
            let field = section.field().unwrap();
            assert_eq!(
                render_value(section.style, field, case.value, &EN),
                case.expected,
                "format {}",
                case.format
            );
        }
    }

    #[test]
    fn test_display_value_of_hour12_and_short_year() {
        let sections = tokenize("hh YY", &EN);
        let date = naive(2024, 4, 30, 0, 0, 0);
        assert_eq!(section_value(&sections[0], &date), Some(12));
        assert_eq!(section_value(&sections[2], &date), Some(24));
        assert_eq!(section_value(&sections[1], &date), None);
        assert_eq!(
            section_value(&sections[0], &naive(2024, 4, 30, 13, 0, 0)),
            Some(1)
        );
    }

    #[test]
    fn test_format_date() {
        let value = utc(2024, 4, 30, 13, 5, 9);
        let sections = tokenize("DD.MM.YYYY HH:mm:ss", &EN);
        assert_eq!(format_date(&sections, &value, &EN), "30.04.2024 13:05:09");

        let sections = tokenize("dddd, MMMM Do YYYY h:mm A", &EN);
        assert_eq!(
            format_date(&sections, &value, &EN),
            "Tuesday, April 30th 2024 1:05 PM"
        );

        let sections = tokenize("LL", &RU);
        assert_eq!(format_date(&sections, &value, &RU), "30 апреля 2024 г.");
    }

    #[test]
    fn test_format_zone_tokens() {
        let value = berlin(2024, 7, 1, 12, 0, 0);
        let sections = tokenize("HH:mm Z", &EN);
        assert_eq!(format_date(&sections, &value, &EN), "12:00 +02:00");
        let sections = tokenize("HH:mm ZZ", &EN);
        assert_eq!(format_date(&sections, &value, &EN), "12:00 +0200");
    }

    #[test]
    fn test_round_trip() {
        let base = naive(2000, 1, 1, 0, 0, 0);
        let cases = [
            ("DD.MM.YYYY HH:mm:ss", &EN),
            ("dddd, MMMM Do YYYY h:mm:ss A", &EN),
            ("YYYYMMDD HHmmss", &EN),
            ("LLLL:ss", &RU),
            ("MMM D, YY hh:mm:ss a Z", &EN),
        ];
        let value = berlin(2024, 11, 5, 18, 7, 9);

        for (format, locale) in cases {
            let sections = tokenize(format, locale);
            let text = format_date(&sections, &value, locale);
            let parsed = parse_date(&sections, &text, locale, value.timezone(), base)
                .unwrap_or_else(|err| panic!("{format}: {text:?}: {err}"));
            assert_eq!(parsed, value, "{format}: {text:?}");
        }
    }

    #[test]
    fn test_round_trip_drops_unrepresented_fields() {
        let sections = tokenize("DD.MM.YYYY", &EN);
        let value = utc(2024, 4, 30, 13, 5, 9);
        let text = format_date(&sections, &value, &EN);
        let parsed = parse_date(&sections, &text, &EN, chrono_tz::UTC, naive(2000, 1, 1, 0, 0, 0));
        assert_eq!(parsed, Ok(utc(2024, 4, 30, 0, 0, 0)));
    }

    #[test]
    fn test_parse_errors() {
        let sections = tokenize("DD.MM.YYYY", &EN);
        let parse = |text: &str| {
            parse_date(&sections, text, &EN, chrono_tz::UTC, naive(2000, 1, 1, 0, 0, 0))
        };

        assert_eq!(parse("   "), Err(ParseError::EmptyInput));
        assert_eq!(
            parse("30/04/2024"),
            Err(ParseError::LiteralMismatch {
                expected: ".".to_owned(),
                offset: 2
            })
        );
        assert!(matches!(
            parse("30.13.2024"),
            Err(ParseError::InvalidField {
                field: FieldKind::Month,
                ..
            })
        ));
        assert_eq!(
            parse("30.04.2024x"),
            Err(ParseError::TrailingInput("x".to_owned()))
        );
        assert_eq!(
            parse("31.04.2024"),
            Err(ParseError::NonexistentDate("31.04.2024".to_owned()))
        );
    }

    #[test]
    fn test_parse_names_case_insensitive() {
        let sections = tokenize("D MMMM YYYY", &EN);
        let parsed = parse_date(
            &sections,
            "5 march 2024",
            &EN,
            chrono_tz::UTC,
            naive(2000, 1, 1, 0, 0, 0),
        );
        assert_eq!(parsed, Ok(utc(2024, 3, 5, 0, 0, 0)));
    }

    #[test]
    fn test_two_digit_year_pivots_to_base_century() {
        let sections = tokenize("DD.MM.YY", &EN);
        let parsed = parse_date(
            &sections,
            "01.02.03",
            &EN,
            chrono_tz::UTC,
            naive(1999, 6, 1, 0, 0, 0),
        );
        assert_eq!(parsed, Ok(utc(1903, 2, 1, 0, 0, 0)));
    }

    #[test]
    fn test_parse_iso() {
        let tz = chrono_tz::UTC;
        assert_eq!(
            parse_iso("2024-04-30T10:00:00.000Z", tz),
            Ok(utc(2024, 4, 30, 10, 0, 0))
        );
        assert_eq!(
            parse_iso("2024-04-30T12:00:00+02:00", tz),
            Ok(utc(2024, 4, 30, 10, 0, 0))
        );
        assert_eq!(parse_iso("2024-04-30", tz), Ok(utc(2024, 4, 30, 0, 0, 0)));
        assert_eq!(
            parse_iso("2024-04-30T08:15", tz),
            Ok(utc(2024, 4, 30, 8, 15, 0))
        );
        assert!(matches!(
            parse_iso("yesterday", tz),
            Err(ParseError::InvalidIso(_))
        ));
    }

    #[test]
    fn test_to_iso() {
        assert_eq!(
            to_iso(&berlin(2024, 7, 1, 12, 0, 0)),
            "2024-07-01T10:00:00.000Z"
        );
    }

    #[test]
    fn test_resolve_local_across_dst() {
        let tz = chrono_tz::Europe::Berlin;

        // 02:30 does not exist on 2024-03-31 in Berlin
        let in_gap = resolve_local(tz, naive(2024, 3, 31, 2, 30, 0));
        assert_eq!(in_gap.naive_local(), naive(2024, 3, 31, 3, 30, 0));

        // 02:30 happens twice on 2024-10-27; the first one is still CEST
        let ambiguous = resolve_local(tz, naive(2024, 10, 27, 2, 30, 0));
        assert_eq!(to_iso(&ambiguous), "2024-10-27T00:30:00.000Z");
    }
}
