//! Line-oriented `option = value` config file parsing.

use std::fmt;

use super::{apply_option, Settings, MAX_CONFIG_ERRORS};
use crate::error::ConfigError;

/// An error tied to a 1-based line of the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub error: ConfigError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Set when parsing stopped early because of too many errors.
    pub gave_up: bool,
}

/// Applies every option in `text` to `settings`. Blank lines, comment lines
/// (`#`, `;`) and section headers (`[...]`) are skipped, and a value ends at
/// an inline comment. Invalid lines are recorded and parsing continues until
/// more than [`MAX_CONFIG_ERRORS`] have been seen.
pub fn parse_config_str(settings: &mut Settings, text: &str) -> ConfigReport {
    let mut report = ConfigReport::default();
    for (index, raw) in text.lines().enumerate() {
        if report.diagnostics.len() > MAX_CONFIG_ERRORS {
            report.gave_up = true;
            break;
        }
        let line = raw.trim_end_matches('\r');
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with(['#', ';', '[']) {
            continue;
        }
        if let Err(error) = parse_line(settings, line) {
            report.diagnostics.push(Diagnostic { line: index + 1, error });
        }
    }
    if report.diagnostics.len() > MAX_CONFIG_ERRORS {
        report.gave_up = true;
    }
    report
}

fn parse_line(settings: &mut Settings, line: &str) -> Result<(), ConfigError> {
    let Some((option, rest)) = line.split_once('=') else {
        return Err(ConfigError::MissingValue(line.trim().to_string()));
    };
    let option = option.trim();
    if option.is_empty() {
        return Err(ConfigError::MissingOption);
    }
    let value = strip_inline_comment(rest.trim_start()).trim();
    if value.is_empty() {
        return Err(ConfigError::MissingValue(option.to_string()));
    }
    apply_option(settings, option, value)
}

/// Cuts `value` at the first `#` or `;`. A `#` opening the value is part of
/// it, so `#rrggbb` colors survive.
fn strip_inline_comment(value: &str) -> &str {
    let skip = usize::from(value.starts_with('#'));
    match value[skip..].find(['#', ';']) {
        Some(end) => &value[..skip + end],
        None => value,
    }
}
