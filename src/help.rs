//! Usage text generation.

use crate::option::CliOption;
use std::cmp::Ordering;
use std::fmt::Write;

/// Usage order: options with a short form first, then by long form.
pub fn compare_options(a: &CliOption, b: &CliOption) -> Ordering {
    b.short_form()
        .is_some()
        .cmp(&a.short_form().is_some())
        .then_with(|| a.long_form().cmp(b.long_form()))
}

/// Render the usage text, one sorted option per line.
pub fn render_usage(application_name: &str, options: &[CliOption]) -> String {
    let mut sorted: Vec<&CliOption> = options.iter().collect();
    sorted.sort_by(|a, b| compare_options(a, b));

    let mut usage = format!("usage: {} [options]\noptions:\n", application_name);
    for option in sorted {
        // Writing to a String cannot fail
        let _ = writeln!(usage, "\t{}", option);
    }
    usage
}
