//! GNU-style tokenizing of an argument vector against registered options.

use crate::config::SetupError;
use crate::help::render_usage;
use crate::locale::Locale;
use crate::option::{check_short_form, CliOption};
use crate::value::{FromValue, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur during argument parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("unknown option '{suboption}' in '{option}'")]
    UnknownSuboption { option: String, suboption: char },

    #[error("option '{flag}' in '{option}' requires a value and cannot be combined")]
    NotFlag { option: String, flag: char },

    #[error("illegal value '{value}' for option {option}")]
    IllegalValue { option: String, value: String },

    #[error("cannot write field '{field}': {message}")]
    Binding { field: String, message: String },

    #[error("failed to write usage: {0}")]
    Output(#[from] io::Error),
}

impl ParseError {
    /// True for every error raised because a token named no usable option.
    pub fn is_unknown_option(&self) -> bool {
        matches!(
            self,
            ParseError::UnknownOption(_)
                | ParseError::UnknownSuboption { .. }
                | ParseError::NotFlag { .. }
        )
    }

    /// The offending token of an unknown-option error.
    pub fn option_name(&self) -> Option<&str> {
        match self {
            ParseError::UnknownOption(option)
            | ParseError::UnknownSuboption { option, .. }
            | ParseError::NotFlag { option, .. } => Some(option),
            _ => None,
        }
    }
}

/// Result of parsing arguments.
pub type ParseResult = Result<(), ParseError>;

/// Registry of options plus the values collected by the last parse.
pub struct CommandLineParser {
    options: Vec<CliOption>,
    /// "-s" and "--size" both map to the option's index
    keys: HashMap<String, usize>,
    values: HashMap<String, Vec<Value>>,
    remaining: Vec<String>,
    application_name: String,
    output: Box<dyn Write + Send>,
}

impl CommandLineParser {
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            keys: HashMap::new(),
            values: HashMap::new(),
            remaining: Vec::new(),
            application_name: "appname".to_string(),
            output: Box::new(io::stderr()),
        }
    }

    /// Register an option. Short and long forms must be unused.
    pub fn add_option(&mut self, option: CliOption) -> Result<&mut CliOption, SetupError> {
        if let Some(short) = option.short_form() {
            check_short_form(short)?;
        }
        let long_key = format!("--{}", option.long_form());
        let short_key = option.short_form().map(|c| format!("-{}", c));

        for key in std::iter::once(&long_key).chain(short_key.as_ref()) {
            if self.keys.contains_key(key) {
                return Err(SetupError::DuplicateOption(key.clone()));
            }
        }

        let index = self.options.len();
        self.keys.insert(long_key, index);
        if let Some(short_key) = short_key {
            self.keys.insert(short_key, index);
        }
        self.options.push(option);
        Ok(&mut self.options[index])
    }

    /// Register `-h/--help`, which prints usage whenever it is seen.
    pub fn add_help_option(&mut self) -> Result<&mut CliOption, SetupError> {
        self.add_option(CliOption::help())
    }

    pub fn option(&self, long: &str) -> Option<&CliOption> {
        self.options.iter().find(|o| o.long_form() == long)
    }

    pub fn option_mut(&mut self, long: &str) -> Option<&mut CliOption> {
        self.options.iter_mut().find(|o| o.long_form() == long)
    }

    pub fn options(&self) -> &[CliOption] {
        &self.options
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn set_application_name(&mut self, name: impl Into<String>) {
        self.application_name = name.into();
    }

    /// Replace the sink used for usage and error text (default: stderr).
    pub fn set_output(&mut self, output: Box<dyn Write + Send>) {
        self.output = output;
    }

    /// Parse `args`, replacing all values and leftovers of a previous parse.
    ///
    /// The first error aborts the scan and leaves no values behind.
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S], locale: &Locale) -> ParseResult {
        self.values.clear();
        self.remaining.clear();
        debug!(args = args.len(), locale = %locale, "parsing arguments");

        let mut values: HashMap<String, Vec<Value>> = HashMap::new();
        let mut remaining = Vec::new();
        let mut args_iter = args.iter().map(AsRef::<str>::as_ref);
        let mut options_enabled = true;

        while let Some(arg) = args_iter.next() {
            if !options_enabled || !arg.starts_with('-') {
                remaining.push(arg.to_string());
                continue;
            }

            if arg == "--" {
                // Everything after is a leftover
                options_enabled = false;
                continue;
            }

            if let Some(option_str) = arg.strip_prefix("--") {
                // --name or --name=value
                let (name, attached) = match option_str.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (option_str, None),
                };
                let index = self
                    .lookup(&format!("--{}", name))
                    .ok_or_else(|| ParseError::UnknownOption(arg.to_string()))?;
                let raw = if self.options[index].value_needed() {
                    attached.or_else(|| args_iter.next())
                } else {
                    None
                };
                self.record(index, raw, locale, &mut values)?;
            } else if arg.chars().count() > 2 {
                // Clustered flags: -dv
                for c in arg.chars().skip(1) {
                    let index = self.lookup(&format!("-{}", c)).ok_or_else(|| {
                        ParseError::UnknownSuboption {
                            option: arg.to_string(),
                            suboption: c,
                        }
                    })?;
                    if self.options[index].value_needed() {
                        return Err(ParseError::NotFlag {
                            option: arg.to_string(),
                            flag: c,
                        });
                    }
                    self.record(index, None, locale, &mut values)?;
                }
            } else {
                let index = self
                    .lookup(arg)
                    .ok_or_else(|| ParseError::UnknownOption(arg.to_string()))?;
                let raw = if self.options[index].value_needed() {
                    args_iter.next()
                } else {
                    None
                };
                self.record(index, raw, locale, &mut values)?;
            }
        }

        debug!(
            options = values.len(),
            remaining = remaining.len(),
            "parsed arguments"
        );
        self.values = values;
        self.remaining = remaining;
        Ok(())
    }

    fn lookup(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    fn record(
        &mut self,
        index: usize,
        raw: Option<&str>,
        locale: &Locale,
        values: &mut HashMap<String, Vec<Value>>,
    ) -> ParseResult {
        let option = &self.options[index];
        let value = option.get_value(raw, locale)?;
        trace!(option = %option.long_form(), value = %value, "option resolved");

        let is_help = option.is_help();
        values
            .entry(option.long_form().to_string())
            .or_default()
            .push(value);

        if is_help {
            self.print_usage()?;
        }
        Ok(())
    }

    /// First value collected for `long`.
    pub fn value(&self, long: &str) -> Option<&Value> {
        self.values(long).first()
    }

    /// First value collected for `long`, as a native type.
    pub fn get<T: FromValue>(&self, long: &str) -> Option<T> {
        self.value(long).and_then(T::from_value)
    }

    /// First value collected for `long`, or `default` if there is none.
    pub fn option_value_or<T: FromValue>(&self, long: &str, default: T) -> T {
        self.get(long).unwrap_or(default)
    }

    /// Every value collected for `long`, in order of occurrence.
    pub fn values(&self, long: &str) -> &[Value] {
        self.values.get(long).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_values(&self, long: &str) -> bool {
        !self.values(long).is_empty()
    }

    /// Tokens that were not consumed as options or option values.
    pub fn remaining_args(&self) -> &[String] {
        &self.remaining
    }

    pub fn render_usage(&self) -> String {
        render_usage(&self.application_name, &self.options)
    }

    /// Write the usage text to the output sink.
    pub fn print_usage(&mut self) -> io::Result<()> {
        let usage = self.render_usage();
        self.output.write_all(usage.as_bytes())?;
        self.output.flush()
    }

    /// Write the error message, a blank line and the usage text.
    pub fn print_error_usage(&mut self, error: &ParseError) -> io::Result<()> {
        writeln!(self.output, "{}", error)?;
        writeln!(self.output)?;
        self.print_usage()
    }
}

impl Default for CommandLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandLineParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLineParser")
            .field("options", &self.options)
            .field("values", &self.values)
            .field("remaining", &self.remaining)
            .field("application_name", &self.application_name)
            .finish_non_exhaustive()
    }
}
