use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FORMAT, DEFAULT_LOCALE, DEFAULT_RANGE_DELIMITER, DEFAULT_TIME_ZONE};
use crate::locale::{EN, Locale};
use crate::prelude::*;

/// Decides whether a complete date may be committed.
pub type UnavailablePredicate = Arc<dyn Fn(&DateTime<Tz>) -> bool + Send + Sync>;

/// Caller-supplied text parser, tried before the built-in one.
pub type DateParser = Arc<dyn Fn(&str, &FieldOptions) -> Option<DateTime<Tz>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Minimum value {min} is after maximum value {max}")]
    MinAfterMax { min: String, max: String },
}

/// Serializable field settings, typically loaded alongside the rest of a
/// form description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    /// IANA zone name
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    #[serde(default = "default_range_delimiter")]
    pub range_delimiter: String,

    /// Wall-clock date used to fill in components nobody has typed yet
    #[serde(default)]
    pub placeholder_value: Option<NaiveDateTime>,

    #[serde(default)]
    pub min_value: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub max_value: Option<DateTime<FixedOffset>>,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_range_delimiter() -> String {
    DEFAULT_RANGE_DELIMITER.to_string()
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            locale: default_locale(),
            time_zone: default_time_zone(),
            range_delimiter: default_range_delimiter(),
            placeholder_value: None,
            min_value: None,
            max_value: None,
        }
    }
}

/// Resolved field settings plus the collaborators that cannot be serialized.
#[derive(Clone)]
pub struct FieldOptions {
    pub format: String,
    pub locale: &'static Locale,
    pub time_zone: Tz,
    pub range_delimiter: String,
    pub placeholder: Option<NaiveDateTime>,
    pub min_value: Option<DateTime<Tz>>,
    pub max_value: Option<DateTime<Tz>>,
    unavailable: Option<UnavailablePredicate>,
    parser: Option<DateParser>,
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("format", &self.format)
            .field("locale", &self.locale.code)
            .field("time_zone", &self.time_zone)
            .field("range_delimiter", &self.range_delimiter)
            .field("placeholder", &self.placeholder)
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("unavailable", &self.unavailable.is_some())
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            format: default_format(),
            locale: &EN,
            time_zone: Tz::UTC,
            range_delimiter: default_range_delimiter(),
            placeholder: None,
            min_value: None,
            max_value: None,
            unavailable: None,
            parser: None,
        }
    }
}

impl FieldOptions {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &FieldConfig) -> Result<Self, ConfigError> {
        let locale = Locale::from_code(&config.locale)
            .ok_or_else(|| ConfigError::UnknownLocale(config.locale.clone()))?;
        let time_zone: Tz = config
            .time_zone
            .parse()
            .map_err(|_| ConfigError::UnknownTimeZone(config.time_zone.clone()))?;

        if let (Some(min), Some(max)) = (config.min_value, config.max_value) {
            if min > max {
                return Err(ConfigError::MinAfterMax {
                    min: min.to_rfc3339(),
                    max: max.to_rfc3339(),
                });
            }
        }

        Ok(Self {
            format: config.format.clone(),
            locale,
            time_zone,
            range_delimiter: config.range_delimiter.clone(),
            placeholder: config.placeholder_value,
            min_value: config.min_value.map(|min| min.with_timezone(&time_zone)),
            max_value: config.max_value.map(|max| max.with_timezone(&time_zone)),
            unavailable: None,
            parser: None,
        })
    }

    #[must_use]
    pub const fn with_locale(mut self, locale: &'static Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub const fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    #[must_use]
    pub const fn with_placeholder(mut self, placeholder: NaiveDateTime) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    #[must_use]
    pub fn with_range_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.range_delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_min_value(mut self, min: DateTime<Tz>) -> Self {
        self.min_value = Some(min);
        self
    }

    #[must_use]
    pub fn with_max_value(mut self, max: DateTime<Tz>) -> Self {
        self.max_value = Some(max);
        self
    }

    #[must_use]
    pub fn with_unavailable_predicate(
        mut self,
        predicate: impl Fn(&DateTime<Tz>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.unavailable = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn with_parser(
        mut self,
        parser: impl Fn(&str, &Self) -> Option<DateTime<Tz>> + Send + Sync + 'static,
    ) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// The date used for components nobody has typed: the configured
    /// placeholder, or today at midnight in the field's zone.
    pub fn placeholder_date(&self) -> NaiveDateTime {
        self.placeholder.unwrap_or_else(|| {
            Utc::now()
                .with_timezone(&self.time_zone)
                .date_naive()
                .and_time(NaiveTime::MIN)
        })
    }

    pub fn is_unavailable(&self, value: &DateTime<Tz>) -> bool {
        self.unavailable
            .as_ref()
            .is_some_and(|predicate| predicate(value))
    }

    /// Whether a complete value may be committed: inside `[min, max]` and not
    /// marked unavailable.
    pub fn accepts(&self, value: &DateTime<Tz>) -> bool {
        self.min_value.is_none_or(|min| *value >= min)
            && self.max_value.is_none_or(|max| *value <= max)
            && !self.is_unavailable(value)
    }

    /// Runs the caller-supplied parser, if one is attached.
    pub(crate) fn custom_parse(&self, text: &str) -> Option<DateTime<Tz>> {
        self.parser.as_ref().and_then(|parser| parser(text, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::RU;
    use crate::test_utils::{naive, utc};

    #[test]
    fn test_config_defaults() {
        let config: FieldConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FieldConfig::default());
        assert_eq!(config.format, "L");
        assert_eq!(config.time_zone, "UTC");
        assert_eq!(config.range_delimiter, " — ");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "format": "DD.MM.YYYY HH:mm",
            "locale": "ru-RU",
            "timeZone": "Europe/Moscow",
            "placeholderValue": "2024-01-15T00:00:00",
            "minValue": "2024-01-01T00:00:00+03:00"
        }"#;
        let config: FieldConfig = serde_json::from_str(json).unwrap();
        let options = FieldOptions::from_config(&config).unwrap();

        assert_eq!(options.locale.code, RU.code);
        assert_eq!(options.time_zone, chrono_tz::Europe::Moscow);
        assert_eq!(options.placeholder, Some(naive(2024, 1, 15, 0, 0, 0)));
        assert_eq!(
            options.min_value.map(|min| min.naive_local()),
            Some(naive(2024, 1, 1, 0, 0, 0))
        );
        assert_eq!(options.max_value, None);
    }

    #[test]
    fn test_config_errors() {
        let config = FieldConfig {
            locale: "xx".to_owned(),
            ..FieldConfig::default()
        };
        assert_eq!(
            FieldOptions::from_config(&config).unwrap_err(),
            ConfigError::UnknownLocale("xx".to_owned())
        );

        let config = FieldConfig {
            time_zone: "Mars/Olympus".to_owned(),
            ..FieldConfig::default()
        };
        assert_eq!(
            FieldOptions::from_config(&config).unwrap_err(),
            ConfigError::UnknownTimeZone("Mars/Olympus".to_owned())
        );

        let json = r#"{"minValue": "2024-02-01T00:00:00Z", "maxValue": "2024-01-01T00:00:00Z"}"#;
        let config: FieldConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            FieldOptions::from_config(&config),
            Err(ConfigError::MinAfterMax { .. })
        ));
    }

    #[test]
    fn test_accepts_bounds_and_predicate() {
        let options = FieldOptions::new("DD.MM.YYYY")
            .with_min_value(utc(2024, 1, 1, 0, 0, 0))
            .with_max_value(utc(2024, 12, 31, 0, 0, 0))
            .with_unavailable_predicate(|value| value.naive_local().day() == 13);

        assert!(options.accepts(&utc(2024, 1, 1, 0, 0, 0)));
        assert!(options.accepts(&utc(2024, 6, 12, 0, 0, 0)));
        assert!(!options.accepts(&utc(2024, 6, 13, 0, 0, 0)));
        assert!(!options.accepts(&utc(2023, 12, 31, 23, 59, 59)));
        assert!(!options.accepts(&utc(2025, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_placeholder_date() {
        let options = FieldOptions::default().with_placeholder(naive(2020, 2, 29, 0, 0, 0));
        assert_eq!(options.placeholder_date(), naive(2020, 2, 29, 0, 0, 0));

        let today = FieldOptions::default().placeholder_date();
        assert_eq!(today.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_debug_hides_closures() {
        let options = FieldOptions::default().with_parser(|_, _| None);
        let debug = format!("{options:?}");
        assert!(debug.contains("parser: true"));
        assert!(debug.contains("unavailable: false"));
    }
}
