//! The option model: identity, arity, coercion and validation of one option.

use crate::config::{SetupError, ValueType};
use crate::locale::Locale;
use crate::parser::ParseError;
use crate::validator::Validator;
use crate::value::{CoerceError, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Coercion for option types outside the built-in set.
pub trait ValueParser: fmt::Debug + Send + Sync {
    fn parse(&self, raw: &str, locale: &Locale) -> Result<Value, CoerceError>;

    /// Whether the option consumes an argument.
    fn value_needed(&self) -> bool {
        true
    }
}

/// How an option turns its raw argument into a [`Value`].
#[derive(Debug, Clone)]
pub enum OptionKind {
    /// A flag; always `true`.
    Boolean,
    Integer,
    Long,
    /// Locale-sensitive.
    Float,
    /// Locale-sensitive.
    Double,
    String,
    /// Explicit chrono pattern, or the locale's short date format.
    Date(Option<String>),
    Custom(Arc<dyn ValueParser>),
    /// Prints usage when seen, records [`Value::Unit`].
    Help,
}

impl OptionKind {
    pub fn value_needed(&self) -> bool {
        match self {
            OptionKind::Boolean | OptionKind::Help => false,
            OptionKind::Custom(parser) => parser.value_needed(),
            _ => true,
        }
    }

    fn coerce(&self, raw: &str, locale: &Locale) -> Result<Value, CoerceError> {
        match self {
            OptionKind::Boolean => Ok(Value::Bool(true)),
            OptionKind::Help => Ok(Value::Unit),
            OptionKind::Integer => Ok(Value::Int(raw.parse()?)),
            OptionKind::Long => Ok(Value::Long(raw.parse()?)),
            OptionKind::Float => {
                let number = locale.parse_number(raw)? as f32;
                if number.is_infinite() {
                    return Err(CoerceError::OutOfRange(raw.to_string()));
                }
                Ok(Value::Float(number))
            }
            OptionKind::Double => Ok(Value::Double(locale.parse_number(raw)?)),
            OptionKind::String => Ok(Value::Str(raw.to_string())),
            OptionKind::Date(format) => Ok(Value::Date(locale.parse_date(raw, format.as_deref())?)),
            OptionKind::Custom(parser) => parser.parse(raw, locale),
        }
    }
}

/// Maps value type names to option kinds, including registered custom types.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    custom: HashMap<String, Arc<dyn ValueParser>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser for a custom value type name.
    pub fn register(&mut self, name: impl Into<String>, parser: Arc<dyn ValueParser>) {
        self.custom.insert(name.into(), parser);
    }

    /// The option kind for `value_type`, `None` for unregistered custom types.
    pub fn resolve(&self, value_type: &ValueType, date_format: Option<&str>) -> Option<OptionKind> {
        let kind = match value_type {
            ValueType::Boolean => OptionKind::Boolean,
            ValueType::Integer => OptionKind::Integer,
            ValueType::Long => OptionKind::Long,
            ValueType::Float => OptionKind::Float,
            ValueType::Double => OptionKind::Double,
            ValueType::String => OptionKind::String,
            ValueType::Date => OptionKind::Date(date_format.map(str::to_string)),
            ValueType::Custom(name) => OptionKind::Custom(Arc::clone(self.custom.get(name)?)),
        };
        Some(kind)
    }
}

/// A short form must be reachable as `-c`: `--` ends option scanning and
/// `=` separates attached values.
pub(crate) fn check_short_form(short: char) -> Result<(), SetupError> {
    if matches!(short, '-' | '=') {
        return Err(SetupError::InvalidShortForm(short));
    }
    Ok(())
}

/// A single recognized option.
#[derive(Debug)]
pub struct CliOption {
    short: Option<char>,
    long: String,
    description: String,
    kind: OptionKind,
    validators: Vec<Box<dyn Validator>>,
}

impl CliOption {
    /// Create an option with the given long form (without leading dashes).
    pub fn new(long: impl Into<String>, kind: OptionKind) -> Result<Self, SetupError> {
        let long = long.into();
        if long.is_empty() || long.contains('=') || long.starts_with('-') {
            return Err(SetupError::InvalidLongForm(long));
        }
        Ok(Self {
            short: None,
            long,
            description: String::new(),
            kind,
            validators: Vec::new(),
        })
    }

    pub fn flag(short: char, long: &str, description: &str) -> Result<Self, SetupError> {
        check_short_form(short)?;
        Ok(Self::new(long, OptionKind::Boolean)?
            .short(short)
            .description(description))
    }

    pub(crate) fn help() -> Self {
        Self {
            short: Some('h'),
            long: "help".to_string(),
            description: "display help".to_string(),
            kind: OptionKind::Help,
            validators: Vec::new(),
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a validator; validators run in the order they were added.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn add_validator(&mut self, validator: Box<dyn Validator>) -> &mut Self {
        self.validators.push(validator);
        self
    }

    pub fn short_form(&self) -> Option<char> {
        self.short
    }

    pub fn long_form(&self) -> &str {
        &self.long
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn validators(&self) -> &[Box<dyn Validator>] {
        &self.validators
    }

    pub fn value_needed(&self) -> bool {
        self.kind.value_needed()
    }

    pub fn is_help(&self) -> bool {
        matches!(self.kind, OptionKind::Help)
    }

    /// The option as it appears in error messages, e.g. `-s/--size`.
    pub fn display_name(&self) -> String {
        match self.short {
            Some(short) => format!("-{}/--{}", short, self.long),
            None => format!("--{}", self.long),
        }
    }

    /// Coerce without validating.
    pub fn parse_value(&self, raw: &str, locale: &Locale) -> Result<Value, ParseError> {
        self.kind.coerce(raw, locale).map_err(|err| {
            debug!(option = %self.long, raw, error = %err, "coercion failed");
            self.illegal_value(raw)
        })
    }

    /// Coerce `raw` and run every validator against the result.
    ///
    /// `raw` is `None` when the argument vector ran out before a value could
    /// be taken; that is an error for options that need one.
    pub fn get_value(&self, raw: Option<&str>, locale: &Locale) -> Result<Value, ParseError> {
        let raw = match raw {
            Some(raw) => raw,
            None if self.value_needed() => return Err(self.illegal_value("")),
            None => "",
        };

        let value = self.parse_value(raw, locale)?;
        for validator in &self.validators {
            if !validator.validate(Some(&value)) {
                debug!(option = %self.long, raw, validator = %validator, "validation failed");
                return Err(self.illegal_value(raw));
            }
        }
        Ok(value)
    }

    fn illegal_value(&self, raw: &str) -> ParseError {
        ParseError::IllegalValue {
            option: self.display_name(),
            value: raw.to_string(),
        }
    }
}

/// Usage line: `-s,--size: description; validator...`
impl fmt::Display for CliOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(short) = self.short {
            write!(f, "-{},", short)?;
        }
        write!(f, "--{}", self.long)?;
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        for validator in &self.validators {
            write!(f, "; {}", validator)?;
        }
        Ok(())
    }
}
