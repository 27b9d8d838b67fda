//! Declarative application schema: JSON loading, validation and registry setup.

use crate::locale::Locale;
use crate::option::{check_short_form, CliOption, TypeRegistry};
use crate::parser::CommandLineParser;
use crate::validator::{IntervalValidator, ValueSetValidator};
use crate::value::Value;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building options, validators or a parser.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid long form '{0}': must be non-empty and contain no '='")]
    InvalidLongForm(String),

    #[error("invalid short form '{0}': must not be '-' or '='")]
    InvalidShortForm(char),

    #[error("option {0} is registered twice")]
    DuplicateOption(String),

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("'{0}' does not declare any options")]
    NoOptions(String),

    #[error("no option type '{type_name}' for field '{field}'")]
    UnresolvedOptionType { field: String, type_name: String },

    #[error("invalid interval [{min}, {max}]: 'min' must not be larger than 'max'")]
    InvalidInterval { min: String, max: String },

    #[error("'{value}' is not a valid bound or allowed value for field '{field}'")]
    InvalidBound { field: String, value: String },

    #[error("'one_of' on field '{0}' is empty: must have at least one value")]
    EmptyValueSet(String),

    #[error("validators cannot be used with flag field '{0}'")]
    ValidatorOnFlag(String),

    #[error("unknown locale '{0}'")]
    UnknownLocale(String),
}

/// Value type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(from = "String")]
pub enum ValueType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    #[default]
    String,
    Date,
    /// Resolved through a [`TypeRegistry`].
    Custom(String),
}

impl From<String> for ValueType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "boolean" | "bool" => ValueType::Boolean,
            "integer" | "int" => ValueType::Integer,
            "long" => ValueType::Long,
            "float" => ValueType::Float,
            "double" => ValueType::Double,
            "string" => ValueType::String,
            "date" => ValueType::Date,
            _ => ValueType::Custom(name),
        }
    }
}

impl ValueType {
    pub fn name(&self) -> &str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Date => "date",
            ValueType::Custom(name) => name,
        }
    }
}

/// Raw interval bounds, coerced with the field's own type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IntervalConfig {
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Declaration of one bound field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Name of the target field
    pub field: String,
    /// Short option character (e.g. 'v' for -v)
    pub short: Option<char>,
    /// Long option name; defaults to the field name
    pub long: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    pub interval: Option<IntervalConfig>,
    /// Admissible values, as raw strings
    pub one_of: Option<Vec<String>>,
    /// chrono pattern for date fields
    pub date_format: Option<String>,
}

impl FieldConfig {
    pub fn new(field: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            field: field.into(),
            short: None,
            long: None,
            description: String::new(),
            value_type,
            interval: None,
            one_of: None,
            date_format: None,
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn interval(mut self, min: Option<&str>, max: Option<&str>) -> Self {
        self.interval = Some(IntervalConfig {
            min: min.map(str::to_string),
            max: max.map(str::to_string),
        });
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// The long form, falling back to the field name.
    pub fn effective_long(&self) -> &str {
        match self.long.as_deref() {
            Some(long) if !long.is_empty() => long,
            _ => &self.field,
        }
    }

    /// Build the option with its declared validators.
    ///
    /// Bounds and allowed values are coerced here, so a bad one fails setup
    /// rather than a later parse.
    pub fn build_option(&self, locale: &Locale, types: &TypeRegistry) -> Result<CliOption, SetupError> {
        let kind = types
            .resolve(&self.value_type, self.date_format.as_deref())
            .ok_or_else(|| SetupError::UnresolvedOptionType {
                field: self.field.clone(),
                type_name: self.value_type.name().to_string(),
            })?;

        let mut option = CliOption::new(self.effective_long(), kind)?.description(&self.description);
        if let Some(short) = self.short {
            option = option.short(short);
        }

        if let Some(interval) = &self.interval {
            let min = self.coerce_bound(&option, interval.min.as_deref(), locale)?;
            let max = self.coerce_bound(&option, interval.max.as_deref(), locale)?;
            if min.is_some() || max.is_some() {
                option = option.validator(IntervalValidator::new(min, max)?);
            }
        }

        if let Some(one_of) = &self.one_of {
            let values = one_of
                .iter()
                .map(|raw| {
                    option
                        .parse_value(raw, locale)
                        .map_err(|_| SetupError::InvalidBound {
                            field: self.field.clone(),
                            value: raw.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            option = option.validator(ValueSetValidator::new(values));
        }

        Ok(option)
    }

    fn coerce_bound(
        &self,
        option: &CliOption,
        raw: Option<&str>,
        locale: &Locale,
    ) -> Result<Option<Value>, SetupError> {
        match raw {
            None | Some("") => Ok(None),
            Some(raw) => option.parse_value(raw, locale).map(Some).map_err(|_| {
                SetupError::InvalidBound {
                    field: self.field.clone(),
                    value: raw.to_string(),
                }
            }),
        }
    }
}

/// Top-level schema of a command-line application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Name shown in usage (default: "appname")
    pub name: Option<String>,
    /// Derive the name from the executable when no name is given
    #[serde(default)]
    pub name_from_package: bool,
    /// Register -h/--help
    #[serde(default)]
    pub enable_help: bool,
    /// Print the error and usage before returning a parse error
    #[serde(default)]
    pub usage_on_error: bool,
    /// Fail the read when a field cannot be written
    #[serde(default)]
    pub strict_binding: bool,
    /// Locale for numeric and date values
    pub locale: Option<Locale>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON string into an AppConfig.
    pub fn from_json(json: &str) -> Result<AppConfig, SetupError> {
        let config: AppConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name_from_package(mut self, enabled: bool) -> Self {
        self.name_from_package = enabled;
        self
    }

    pub fn enable_help(mut self, enabled: bool) -> Self {
        self.enable_help = enabled;
        self
    }

    pub fn usage_on_error(mut self, enabled: bool) -> Self {
        self.usage_on_error = enabled;
        self
    }

    pub fn strict_binding(mut self, enabled: bool) -> Self {
        self.strict_binding = enabled;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate the schema without resolving types.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.fields.is_empty() {
            let name = self.name.as_deref().unwrap_or("application");
            return Err(SetupError::NoOptions(name.to_string()));
        }

        let mut names = HashSet::new();
        let mut longs = HashSet::new();
        let mut shorts = HashSet::new();

        for field in &self.fields {
            if !names.insert(&field.field) {
                return Err(SetupError::DuplicateField(field.field.clone()));
            }
            let long = field.effective_long();
            if !longs.insert(long) || (self.enable_help && long == "help") {
                return Err(SetupError::DuplicateOption(format!("--{}", long)));
            }
            if let Some(short) = field.short {
                check_short_form(short)?;
                if !shorts.insert(short) || (self.enable_help && short == 'h') {
                    return Err(SetupError::DuplicateOption(format!("-{}", short)));
                }
            }
            Self::validate_validators(field)?;
        }

        Ok(())
    }

    fn validate_validators(field: &FieldConfig) -> Result<(), SetupError> {
        let has_validators = field.interval.is_some() || field.one_of.is_some();
        if has_validators && field.value_type == ValueType::Boolean {
            return Err(SetupError::ValidatorOnFlag(field.field.clone()));
        }
        if field.one_of.as_ref().is_some_and(Vec::is_empty) {
            return Err(SetupError::EmptyValueSet(field.field.clone()));
        }
        Ok(())
    }

    /// The name shown in usage: a literal name wins over the executable's.
    pub fn effective_name(&self, executable: Option<&Path>) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        if self.name_from_package {
            return executable
                .and_then(Path::file_stem)
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        None
    }

    /// Build a parser holding one option per field, plus help if enabled.
    pub fn build_parser(
        &self,
        locale: &Locale,
        types: &TypeRegistry,
        executable: Option<&Path>,
    ) -> Result<CommandLineParser, SetupError> {
        self.validate()?;

        let mut parser = CommandLineParser::new();
        for field in &self.fields {
            parser.add_option(field.build_option(locale, types)?)?;
        }
        if self.enable_help {
            parser.add_help_option()?;
        }
        if let Some(name) = self.effective_name(executable) {
            parser.set_application_name(name);
        }
        Ok(parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TEST_APP: &str = r#"{
        "name": "TestApp",
        "enable_help": true,
        "usage_on_error": true,
        "fields": [
            {"field": "size", "short": "s", "long": "size", "type": "integer",
             "description": "a fancy size value", "interval": {"min": "0", "max": "100"}},
            {"field": "text", "one_of": ["Hello World", "foo"]},
            {"field": "d", "type": "double"},
            {"field": "when", "type": "date", "date_format": "%Y-%m-%d"}
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_json(TEST_APP).unwrap();
        assert_eq!(config.name, Some("TestApp".to_string()));
        assert!(config.enable_help);
        assert!(config.usage_on_error);
        assert!(!config.strict_binding);
        assert!(!config.name_from_package);
        assert_eq!(config.fields.len(), 4);

        let size = &config.fields[0];
        assert_eq!(size.short, Some('s'));
        assert_eq!(size.value_type, ValueType::Integer);
        assert_eq!(
            size.interval,
            Some(IntervalConfig {
                min: Some("0".to_string()),
                max: Some("100".to_string())
            })
        );

        let text = &config.fields[1];
        assert_eq!(text.value_type, ValueType::String);
        assert_eq!(text.effective_long(), "text");

        config.validate().unwrap();
    }

    #[test]
    fn test_parse_locale() {
        let config = AppConfig::from_json(r#"{"locale": "de-DE", "fields": []}"#).unwrap();
        assert_eq!(config.locale, Some(Locale::germany()));

        let result = AppConfig::from_json(r#"{"locale": "xx-YY"}"#);
        assert!(matches!(result, Err(SetupError::Json(_))));
    }

    #[test]
    fn test_custom_type_name() {
        let config =
            AppConfig::from_json(r#"{"fields": [{"field": "c", "type": "color"}]}"#).unwrap();
        assert_eq!(
            config.fields[0].value_type,
            ValueType::Custom("color".to_string())
        );
    }

    #[test]
    fn test_error_on_no_fields() {
        let config = AppConfig::from_json(r#"{"name": "empty"}"#).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(SetupError::NoOptions(name)) if name == "empty"));
    }

    #[test]
    fn test_error_on_duplicate_field() {
        let config = AppConfig::new()
            .field(FieldConfig::new("dup", ValueType::Boolean).long("a"))
            .field(FieldConfig::new("dup", ValueType::Boolean).long("b"));
        assert!(matches!(config.validate(), Err(SetupError::DuplicateField(name)) if name == "dup"));
    }

    #[test]
    fn test_error_on_duplicate_long() {
        let config = AppConfig::new()
            .field(FieldConfig::new("a", ValueType::Boolean).long("same"))
            .field(FieldConfig::new("b", ValueType::Boolean).long("same"));
        assert!(matches!(config.validate(), Err(SetupError::DuplicateOption(o)) if o == "--same"));
    }

    #[test]
    fn test_error_on_short_clashing_with_help() {
        let config = AppConfig::new()
            .enable_help(true)
            .field(FieldConfig::new("height", ValueType::Integer).short('h'));
        assert!(matches!(config.validate(), Err(SetupError::DuplicateOption(o)) if o == "-h"));
    }

    #[test]
    fn test_error_on_invalid_short_form() {
        let config = AppConfig::new().field(FieldConfig::new("dash", ValueType::Boolean).short('-'));
        assert!(matches!(config.validate(), Err(SetupError::InvalidShortForm('-'))));
    }

    #[test]
    fn test_error_on_validator_on_flag() {
        let config = AppConfig::new()
            .field(FieldConfig::new("verbose", ValueType::Boolean).one_of(["yes"]));
        assert!(matches!(
            config.validate(),
            Err(SetupError::ValidatorOnFlag(name)) if name == "verbose"
        ));
    }

    #[test]
    fn test_error_on_empty_one_of() {
        let config = AppConfig::new()
            .field(FieldConfig::new("format", ValueType::String).one_of(Vec::<String>::new()));
        assert!(matches!(
            config.validate(),
            Err(SetupError::EmptyValueSet(name)) if name == "format"
        ));
    }

    #[test]
    fn test_build_option_with_validators() {
        let config = AppConfig::from_json(TEST_APP).unwrap();
        let types = TypeRegistry::new();

        let size = config.fields[0].build_option(&Locale::us(), &types).unwrap();
        assert_eq!(size.to_string(), "-s,--size: a fancy size value; interval [0, 100]");

        let text = config.fields[1].build_option(&Locale::us(), &types).unwrap();
        assert_eq!(text.to_string(), "--text; allowed values [Hello World, foo]");
    }

    #[test]
    fn test_bounds_use_locale() {
        let field = FieldConfig::new("f", ValueType::Double).interval(Some("-10,3"), Some("2,6"));
        let option = field.build_option(&Locale::germany(), &TypeRegistry::new()).unwrap();
        assert_eq!(option.to_string(), "--f; interval [-10.3, 2.6]");
    }

    #[test]
    fn test_error_on_uncoercible_bound() {
        let field = FieldConfig::new("size", ValueType::Integer).interval(Some("zero"), None);
        let result = field.build_option(&Locale::us(), &TypeRegistry::new());
        assert!(matches!(
            result,
            Err(SetupError::InvalidBound { field, value }) if field == "size" && value == "zero"
        ));

        let field = FieldConfig::new("size", ValueType::Integer).one_of(["1", "two"]);
        let result = field.build_option(&Locale::us(), &TypeRegistry::new());
        assert!(matches!(result, Err(SetupError::InvalidBound { value, .. }) if value == "two"));
    }

    #[test]
    fn test_error_on_inverted_interval() {
        let field = FieldConfig::new("size", ValueType::Integer).interval(Some("100"), Some("0"));
        let result = field.build_option(&Locale::us(), &TypeRegistry::new());
        assert!(matches!(result, Err(SetupError::InvalidInterval { .. })));
    }

    #[test]
    fn test_empty_bounds_add_no_validator() {
        let field = FieldConfig::new("size", ValueType::Integer).interval(Some(""), None);
        let option = field.build_option(&Locale::us(), &TypeRegistry::new()).unwrap();
        assert!(option.validators().is_empty());
    }

    #[test]
    fn test_error_on_unresolved_type() {
        let field = FieldConfig::new("c", ValueType::Custom("color".to_string()));
        let result = field.build_option(&Locale::us(), &TypeRegistry::new());
        assert!(matches!(
            result,
            Err(SetupError::UnresolvedOptionType { field, type_name }) if field == "c" && type_name == "color"
        ));
    }

    #[test]
    fn test_effective_name() {
        let exe = PathBuf::from("/usr/local/bin/frobnicate");

        let config = AppConfig::new().name("Literal").name_from_package(true);
        assert_eq!(config.effective_name(Some(&exe)), Some("Literal".to_string()));

        let config = AppConfig::new().name_from_package(true);
        assert_eq!(config.effective_name(Some(&exe)), Some("frobnicate".to_string()));
        assert_eq!(config.effective_name(None), None);

        let config = AppConfig::new();
        assert_eq!(config.effective_name(Some(&exe)), None);
    }

    #[test]
    fn test_build_parser() {
        let config = AppConfig::from_json(TEST_APP).unwrap();
        let parser = config
            .build_parser(&Locale::us(), &TypeRegistry::new(), None)
            .unwrap();
        assert_eq!(parser.application_name(), "TestApp");
        assert!(parser.option("help").is_some());
        assert!(parser.option("size").is_some());
        assert!(parser.option("d").is_some());
    }
}
