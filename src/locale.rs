//! Locale conventions used by numeric and date coercion.
//!
//! A [`Locale`] is always passed explicitly; nothing here reads the process
//! environment.

use crate::config::SetupError;
use crate::value::CoerceError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Number and date conventions of a language/region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
    decimal_separator: char,
    grouping_separator: char,
    short_date: &'static str,
}

/// (tag, decimal separator, grouping separator, short date pattern)
const KNOWN_LOCALES: &[(&str, char, char, &str)] = &[
    ("en-US", '.', ',', "%m/%d/%y"),
    ("en-GB", '.', ',', "%d/%m/%y"),
    ("en-CA", '.', ',', "%y-%m-%d"),
    ("en-AU", '.', ',', "%d/%m/%y"),
    ("de-DE", ',', '.', "%d.%m.%y"),
    ("de-AT", ',', '.', "%d.%m.%y"),
    ("de-CH", '.', '\'', "%d.%m.%y"),
    ("fr-FR", ',', '\u{a0}', "%d/%m/%y"),
    ("fr-CA", ',', '\u{a0}', "%y-%m-%d"),
    ("it-IT", ',', '.', "%d/%m/%y"),
    ("es-ES", ',', '.', "%d/%m/%y"),
    ("nl-NL", ',', '.', "%d-%m-%y"),
    ("pt-BR", ',', '.', "%d/%m/%y"),
    ("ja-JP", '.', ',', "%y/%m/%d"),
    ("zh-CN", '.', ',', "%y-%m-%d"),
];

impl Locale {
    /// US English: `1,000.5`, `12/31/11`.
    pub fn us() -> Self {
        Self {
            tag: "en-US".to_string(),
            decimal_separator: '.',
            grouping_separator: ',',
            short_date: "%m/%d/%y",
        }
    }

    /// German (Germany): `1.000,5`, `31.12.11`.
    pub fn germany() -> Self {
        Self {
            tag: "de-DE".to_string(),
            decimal_separator: ',',
            grouping_separator: '.',
            short_date: "%d.%m.%y",
        }
    }

    /// Resolve a tag such as `de-DE`, `de_DE` or just `de`.
    fn lookup(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-");
        let entry = KNOWN_LOCALES
            .iter()
            .find(|(known, ..)| known.eq_ignore_ascii_case(&normalized))
            .or_else(|| {
                // Language only: first region listed for it
                let language = normalized.split('-').next().unwrap_or_default();
                KNOWN_LOCALES.iter().find(|(known, ..)| {
                    known
                        .split('-')
                        .next()
                        .is_some_and(|l| l.eq_ignore_ascii_case(language))
                })
            })?;

        let (tag, decimal_separator, grouping_separator, short_date) = *entry;
        Some(Self {
            tag: tag.to_string(),
            decimal_separator,
            grouping_separator,
            short_date,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn grouping_separator(&self) -> char {
        self.grouping_separator
    }

    /// The chrono pattern of the short date format.
    pub fn short_date_format(&self) -> &str {
        self.short_date
    }

    /// Parse a decimal number written in this locale's conventions.
    ///
    /// Grouping separators are accepted in the integral part only. The whole
    /// string must be consumed.
    pub fn parse_number(&self, raw: &str) -> Result<f64, CoerceError> {
        let malformed = || CoerceError::Number(raw.to_string());

        let (integral, fraction) = match raw.split_once(self.decimal_separator) {
            Some((integral, fraction)) => (integral, Some(fraction)),
            None => (raw, None),
        };

        let mut normalized: String = integral
            .chars()
            .filter(|&c| c != self.grouping_separator)
            .collect();
        if let Some(fraction) = fraction {
            normalized.push('.');
            normalized.push_str(fraction);
        }

        let plain = normalized
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if normalized.is_empty() || !plain {
            return Err(malformed());
        }

        let number: f64 = normalized.parse()?;
        if !number.is_finite() {
            return Err(CoerceError::OutOfRange(raw.to_string()));
        }
        Ok(number)
    }

    /// Parse a date using `format`, or this locale's short date format.
    ///
    /// The short format has a two-digit year; a four-digit year is accepted
    /// as well.
    pub fn parse_date(&self, raw: &str, format: Option<&str>) -> Result<NaiveDate, CoerceError> {
        if let Some(format) = format {
            return Ok(NaiveDate::parse_from_str(raw, format)?);
        }

        match NaiveDate::parse_from_str(raw, self.short_date) {
            Ok(date) => Ok(date),
            Err(short_err) => {
                let long_year = self.short_date.replace("%y", "%Y");
                NaiveDate::parse_from_str(raw, &long_year).map_err(|_| short_err.into())
            }
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::us()
    }
}

impl FromStr for Locale {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| SetupError::UnknownLocale(s.to_string()))
    }
}

/// Deserialized from its tag, e.g. `"de-DE"`.
impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!("de-DE".parse::<Locale>().unwrap(), Locale::germany());
        assert_eq!("de_DE".parse::<Locale>().unwrap(), Locale::germany());
        assert_eq!("en-us".parse::<Locale>().unwrap(), Locale::us());
        assert_eq!("fr".parse::<Locale>().unwrap().tag(), "fr-FR");
    }

    #[test]
    fn test_unknown_locale() {
        let result = "xx-YY".parse::<Locale>();
        assert!(matches!(result, Err(SetupError::UnknownLocale(tag)) if tag == "xx-YY"));
    }

    #[test]
    fn test_deserialize_tag() {
        let locale: Locale = serde_json::from_str(r#""de_DE""#).unwrap();
        assert_eq!(locale, Locale::germany());

        let result = serde_json::from_str::<Locale>(r#""xx-YY""#);
        assert!(result.unwrap_err().to_string().contains("unknown locale 'xx-YY'"));
    }

    #[test]
    fn test_parse_number_us() {
        let us = Locale::us();
        assert_eq!(us.parse_number("0.2").unwrap(), 0.2);
        assert_eq!(us.parse_number("-10").unwrap(), -10.0);
        assert_eq!(us.parse_number("1,000.5").unwrap(), 1000.5);
        assert!(us.parse_number("0,2.5,1").is_err());
    }

    #[test]
    fn test_parse_number_germany() {
        let de = Locale::germany();
        assert_eq!(de.parse_number("0,2").unwrap(), 0.2);
        assert_eq!(de.parse_number("1.000,5").unwrap(), 1000.5);
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        let us = Locale::us();
        assert!(us.parse_number("").is_err());
        assert!(us.parse_number("abc").is_err());
        assert!(us.parse_number("inf").is_err());
        assert!(us.parse_number("NaN").is_err());
        assert!(us.parse_number("1.5x").is_err());
    }

    #[test]
    fn test_parse_number_overflow() {
        let result = Locale::us().parse_number("1e999");
        assert!(matches!(result, Err(CoerceError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_short_date() {
        let expected = NaiveDate::from_ymd_opt(2011, 12, 31).unwrap();
        assert_eq!(Locale::us().parse_date("12/31/11", None).unwrap(), expected);
        assert_eq!(Locale::germany().parse_date("31.12.11", None).unwrap(), expected);
        assert_eq!(Locale::germany().parse_date("31.12.2011", None).unwrap(), expected);
        assert!(Locale::us().parse_date("31.12.11", None).is_err());
    }

    #[test]
    fn test_parse_date_explicit_format() {
        let expected = NaiveDate::from_ymd_opt(2011, 12, 31).unwrap();
        let parsed = Locale::germany()
            .parse_date("2011-12-31", Some("%Y-%m-%d"))
            .unwrap();
        assert_eq!(parsed, expected);
    }
}
