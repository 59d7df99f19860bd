/// Minimum valid year (inclusive)
pub const MIN_YEAR: i32 = 1;
/// Maximum valid year (inclusive)
pub const MAX_YEAR: i32 = 9999;

/// Maximum valid month (December)
pub const MAX_MONTH: i32 = 12;

/// First day of month, used for lower bounds
pub const MIN_DAY: i32 = 1;
/// Longest month of any calendar year
pub const MAX_DAYS_IN_MONTH: i32 = 31;

/// Month number for January
pub const JANUARY: i32 = 1;
/// Month number for February
pub const FEBRUARY: i32 = 2;
/// Month number for December
pub const DECEMBER: i32 = 12;

/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: i32 = 29;

/// Maximum days in each month (index 0 is unused, months are 1-indexed)
/// February shows 28 days (non-leap year default)
pub const DAYS_IN_MONTH: [i32; 13] = [
    0,  // index 0 unused (months are 1-indexed)
    31, // January
    28, // February (non-leap, adjusted by is_leap_year check)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

/// Leap year occurs every 4 years
pub(crate) const LEAP_YEAR_CYCLE: i32 = 4;
/// Century years are not leap years unless...
pub(crate) const CENTURY_CYCLE: i32 = 100;
/// ...they are divisible by 400 (Gregorian calendar correction)
pub(crate) const GREGORIAN_CYCLE: i32 = 400;

/// Months in a calendar quarter
pub const MONTHS_PER_QUARTER: i32 = 3;
/// Last quarter of the year (quarters are 1-based)
pub const MAX_QUARTER: i32 = 4;
/// Days in a week; weekdays run 0 (Sunday) to 6
pub const DAYS_PER_WEEK: i32 = 7;
/// Hours in each half of a 12-hour clock day
pub const HOURS_PER_PERIOD: i32 = 12;
/// Largest stored hour (stored hours are always 24-hour)
pub const MAX_HOUR: i32 = 23;
/// Largest minute value
pub const MAX_MINUTE: i32 = 59;
/// Largest second value; leap seconds are not represented
pub const MAX_SECOND: i32 = 59;

/// Day-period value for hours 0 through 11
pub const AM: i32 = 0;
/// Day-period value for hours 12 through 23
pub const PM: i32 = 1;

/// Format used when a configuration does not name one (locale short date)
pub const DEFAULT_FORMAT: &str = "L";
/// Locale used when a configuration does not name one
pub const DEFAULT_LOCALE: &str = "en";
/// IANA zone used when a configuration does not name one
pub const DEFAULT_TIME_ZONE: &str = "UTC";
/// Text shown between the start and end of a range field
pub const DEFAULT_RANGE_DELIMITER: &str = " — ";
/// Separator between start and end in the serialized (ISO 8601) form of a range
pub const RANGE_SEPARATOR: char = '/';

/// Filler shown for an empty AM/PM section
pub const DAY_PERIOD_PLACEHOLDER: &str = "--";
