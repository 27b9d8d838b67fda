//! JSON rendering of a finished parse.

use crate::parser::CommandLineParser;
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a parse produced, keyed by long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedOutput {
    /// Values of every option that occurred, in order of occurrence
    pub values: BTreeMap<String, Vec<Value>>,
    pub remaining: Vec<String>,
    pub help_requested: bool,
}

impl ParsedOutput {
    /// Collect the results of the parser's last successful parse.
    pub fn from_parser(parser: &CommandLineParser) -> Self {
        let values = parser
            .options()
            .iter()
            .filter(|option| parser.has_values(option.long_form()))
            .map(|option| {
                let long = option.long_form();
                (long.to_string(), parser.values(long).to_vec())
            })
            .collect();

        let help_requested = parser
            .options()
            .iter()
            .any(|option| option.is_help() && parser.has_values(option.long_form()));

        Self {
            values,
            remaining: parser.remaining_args().to_vec(),
            help_requested,
        }
    }
}

/// Render the parse results as pretty-printed JSON.
pub fn generate_output_string(parser: &CommandLineParser) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ParsedOutput::from_parser(parser))
}
