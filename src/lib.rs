//! tinyargs - GNU-style command-line option parsing.
//!
//! This library recognizes short (`-v`), long (`--verbose`), valued
//! (`-d 2`, `--debug=2`) and clustered (`-dv`) options, coerces their values
//! to typed [`Value`]s under an explicit [`Locale`], validates them, and can
//! bind the results onto the fields of an application struct through a
//! declarative schema.

pub mod config;
pub mod help;
pub mod locale;
pub mod option;
pub mod output;
pub mod parser;
pub mod reader;
pub mod validator;
pub mod value;

pub use config::{AppConfig, FieldConfig, IntervalConfig, SetupError, ValueType};
pub use help::render_usage;
pub use locale::Locale;
pub use option::{CliOption, OptionKind, TypeRegistry, ValueParser};
pub use output::{generate_output_string, ParsedOutput};
pub use parser::{CommandLineParser, ParseError, ParseResult};
pub use reader::{field_value, CommandLineApp, CommandLineReader, FieldError, ReaderBuilder};
pub use validator::{IntervalValidator, Validator, ValueSetValidator};
pub use value::{CoerceError, FromValue, Value};
