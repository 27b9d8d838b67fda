//! Binding of parsed option values onto the fields of an application struct.
//!
//! A type implements [`CommandLineApp`] to declare its options and to accept
//! values by field name. [`CommandLineReader`] builds the parser from that
//! declaration, parses and writes every supplied value back.

use crate::config::{AppConfig, SetupError};
use crate::locale::Locale;
use crate::option::{TypeRegistry, ValueParser};
use crate::parser::{CommandLineParser, ParseError};
use crate::value::{FromValue, Value};
use std::any::type_name;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned when a value cannot be written to a field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("no field named '{0}'")]
    UnknownField(String),

    #[error("field '{field}' cannot hold a {value} value")]
    TypeMismatch { field: String, value: String },
}

/// Convert `value` for assignment to `field`.
pub fn field_value<T: FromValue>(field: &str, value: &Value) -> Result<T, FieldError> {
    T::from_value(value).ok_or_else(|| FieldError::TypeMismatch {
        field: field.to_string(),
        value: value.type_name().to_string(),
    })
}

/// A struct whose fields are filled from the command line.
pub trait CommandLineApp {
    /// The option declarations of this type.
    fn schema() -> Result<AppConfig, SetupError>;

    /// Write `value` into the field named `field`.
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), FieldError>;
}

/// Setup of a [`CommandLineReader`] beyond the type's own schema.
#[derive(Default)]
pub struct ReaderBuilder {
    locale: Option<Locale>,
    types: TypeRegistry,
    executable: Option<PathBuf>,
    output: Option<Box<dyn Write + Send>>,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the schema's locale.
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Register a parser for a custom field type name.
    pub fn custom_type(mut self, name: impl Into<String>, parser: Arc<dyn ValueParser>) -> Self {
        self.types.register(name, parser);
        self
    }

    /// Path the application name is derived from when the schema asks for it.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build<T: CommandLineApp>(self, target: T) -> Result<CommandLineReader<T>, SetupError> {
        let schema = T::schema()?;
        if schema.fields.is_empty() {
            return Err(SetupError::NoOptions(type_name::<T>().to_string()));
        }

        let locale = self
            .locale
            .or_else(|| schema.locale.clone())
            .unwrap_or_default();
        let mut parser = schema.build_parser(&locale, &self.types, self.executable.as_deref())?;
        if let Some(output) = self.output {
            parser.set_output(output);
        }

        let bindings = schema
            .fields
            .iter()
            .map(|f| (f.field.clone(), f.effective_long().to_string()))
            .collect();

        debug!(
            target_type = type_name::<T>(),
            options = parser.options().len(),
            locale = %locale,
            "reader ready"
        );
        Ok(CommandLineReader {
            target,
            parser,
            bindings,
            locale,
            usage_on_error: schema.usage_on_error,
            strict_binding: schema.strict_binding,
        })
    }

    pub fn build_default<T: CommandLineApp + Default>(self) -> Result<CommandLineReader<T>, SetupError> {
        self.build(T::default())
    }
}

/// Parses arguments into a target of type `T`.
#[derive(Debug)]
pub struct CommandLineReader<T> {
    target: T,
    parser: CommandLineParser,
    /// (field name, long form)
    bindings: Vec<(String, String)>,
    locale: Locale,
    usage_on_error: bool,
    strict_binding: bool,
}

impl<T: CommandLineApp> CommandLineReader<T> {
    /// Reader over `target` with the schema's own settings.
    pub fn new(target: T) -> Result<Self, SetupError> {
        ReaderBuilder::new().build(target)
    }
}

impl<T: CommandLineApp + Clone> CommandLineReader<T> {
    /// Parse `args` and write every supplied option into the target.
    ///
    /// Fields whose option did not occur keep their current value. A field
    /// that rejects its value is skipped unless the schema asks for strict
    /// binding; then the writes go to a copy of the target, which replaces
    /// it only if every field accepted its value.
    pub fn read<S: AsRef<str>>(&mut self, args: &[S]) -> Result<&mut T, ParseError> {
        if let Err(err) = self.parser.parse(args, &self.locale) {
            if self.usage_on_error {
                if let Err(io_err) = self.parser.print_error_usage(&err) {
                    warn!(error = %io_err, "failed to write usage");
                }
            }
            return Err(err);
        }

        let supplied = self.bindings.iter().filter_map(|(field, long)| {
            self.parser.value(long).map(|value| (field, value.clone()))
        });

        if self.strict_binding {
            let mut staged = self.target.clone();
            for (field, value) in supplied {
                staged
                    .set_field(field, value)
                    .map_err(|err| ParseError::Binding {
                        field: field.clone(),
                        message: err.to_string(),
                    })?;
            }
            self.target = staged;
        } else {
            for (field, value) in supplied {
                if let Err(err) = self.target.set_field(field, value) {
                    debug!(field = %field, error = %err, "field left unchanged");
                }
            }
        }

        Ok(&mut self.target)
    }
}

impl<T> CommandLineReader<T> {
    /// Whether `-h/--help` occurred in the last read.
    pub fn help_requested(&self) -> bool {
        self.parser.option("help").is_some_and(|o| o.is_help()) && self.parser.has_values("help")
    }

    pub fn remaining_args(&self) -> &[String] {
        self.parser.remaining_args()
    }

    pub fn set_output(&mut self, output: Box<dyn Write + Send>) {
        self.parser.set_output(output);
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    pub fn parser(&self) -> &CommandLineParser {
        &self.parser
    }
}
