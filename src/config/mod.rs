//! Settings and how they are loaded: the config file first, then
//! command-line overrides, both through [`apply_option`].

mod parse;

pub mod cli;

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::core::candidate::CandidateSource;
use crate::core::style::{Anchor, Color, Layout, Orientation, Padding, Style};
use crate::error::ConfigError;

pub use parse::{parse_config_str, ConfigReport, Diagnostic};

/// Parsing stops once more errors than this have been seen.
pub const MAX_CONFIG_ERRORS: usize = 5;

/// Config files larger than this are refused.
pub const MAX_CONFIG_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub style: Style,
    pub layout: Layout,
    pub fuzzy_match: bool,
    pub hide_cursor: bool,
    pub source: CandidateSource,
}

/// `$XDG_CONFIG_HOME/tofi/config`, else `$HOME/.config/tofi/config`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(base) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(Path::new(&base).join("tofi/config"));
    }
    env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| Path::new(&home).join(".config/tofi/config"))
}

/// Loads a config file into `settings`. Without `explicit`, the default path
/// is used and a missing file there is not an error.
pub fn load(settings: &mut Settings, explicit: Option<&Path>) -> Result<ConfigReport, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                debug!("no config directory, skipping config file");
                return Ok(ConfigReport::default());
            }
        },
    };

    let unreadable = |err: io::Error| ConfigError::Unreadable {
        path: path.clone(),
        message: err.to_string(),
    };
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(err) if explicit.is_none() && err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file");
            return Ok(ConfigReport::default());
        }
        Err(err) => return Err(unreadable(err)),
    };
    if meta.len() > MAX_CONFIG_SIZE {
        return Err(ConfigError::FileTooLarge);
    }
    let bytes = fs::read(&path).map_err(unreadable)?;
    let text = String::from_utf8_lossy(&bytes);

    debug!(path = %path.display(), "loading config file");
    let report = parse_config_str(settings, &text);
    for diagnostic in &report.diagnostics {
        error!("{diagnostic}");
    }
    if report.gave_up {
        return Err(ConfigError::TooManyErrors(MAX_CONFIG_ERRORS));
    }
    Ok(report)
}

/// Assigns one option. Names are case-insensitive.
pub fn apply_option(settings: &mut Settings, option: &str, value: &str) -> Result<(), ConfigError> {
    let style = &mut settings.style;
    let layout = &mut settings.layout;
    match option.to_ascii_lowercase().as_str() {
        "anchor" => {
            layout.anchor = Anchor::from_name(value).ok_or_else(|| ConfigError::InvalidAnchor(value.to_string()))?;
        }
        "width" => layout.width = parse_uint(value)?,
        "height" => layout.height = parse_uint(value)?,
        "margin-top" => layout.margin_top = parse_uint(value)?,
        "margin-bottom" => layout.margin_bottom = parse_uint(value)?,
        "margin-left" => layout.margin_left = parse_uint(value)?,
        "margin-right" => layout.margin_right = parse_uint(value)?,
        "num-results" => layout.max_results = parse_uint(value)?,
        "horizontal" => {
            layout.orientation = if parse_bool(value)? {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
        }
        "background-color" | "entry-color" => style.background = parse_color(value)?,
        "border-color" => style.border_color = parse_color(value)?,
        "outline-color" => style.outline_color = parse_color(value)?,
        "text-color" => style.foreground = parse_color(value)?,
        "selection-foreground-color" | "selection-color" => style.selection_foreground = parse_color(value)?,
        "selection-background-color" => style.selection_background = parse_color(value)?,
        "selection-highlight-color" => style.selection_highlight = Some(parse_color(value)?),
        "border-width" => style.border_width = parse_uint(value)?,
        "outline-width" => style.outline_width = parse_uint(value)?,
        "corner-radius" => style.corner_radius = parse_uint(value)?,
        "entry-padding" => style.padding = Padding::uniform(parse_uint(value)?),
        "padding-top" => style.padding.top = parse_uint(value)?,
        "padding-bottom" => style.padding.bottom = parse_uint(value)?,
        "padding-left" => style.padding.left = parse_uint(value)?,
        "padding-right" => style.padding.right = parse_uint(value)?,
        "result-spacing" | "result-padding" => style.result_spacing = parse_int(value)?,
        "selection-background-padding" => style.selection_background_padding = parse_int(value)?,
        "font-size" => style.font_size = parse_uint(value)?,
        "min-input-width" => style.min_input_width = parse_uint(value)?,
        "font-name" => style.font_name = value.to_string(),
        "prompt-text" => style.prompt_text = value.to_string(),
        "hide-cursor" => settings.hide_cursor = parse_bool(value)?,
        "fuzzy-match" => settings.fuzzy_match = parse_bool(value)?,
        "drun" => {
            settings.source = if parse_bool(value)? {
                CandidateSource::Desktop
            } else {
                CandidateSource::Lines
            };
        }
        _ => return Err(ConfigError::UnknownOption(option.to_string())),
    }
    Ok(())
}

/// Every option name [`apply_option`] accepts.
pub const OPTION_NAMES: &[&str] = &[
    "anchor",
    "width",
    "height",
    "margin-top",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "num-results",
    "horizontal",
    "background-color",
    "entry-color",
    "border-color",
    "outline-color",
    "text-color",
    "selection-foreground-color",
    "selection-color",
    "selection-background-color",
    "selection-highlight-color",
    "border-width",
    "outline-width",
    "corner-radius",
    "entry-padding",
    "padding-top",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "result-spacing",
    "result-padding",
    "selection-background-padding",
    "font-size",
    "min-input-width",
    "font-name",
    "prompt-text",
    "hide-cursor",
    "fuzzy-match",
    "drun",
];

/// Options whose value is a boolean; on the command line they may be given
/// without a value.
pub const BOOL_OPTIONS: &[&str] = &["horizontal", "hide-cursor", "fuzzy-match", "drun"];

pub fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::InvalidBool(value.to_string()))
    }
}

pub fn parse_color(value: &str) -> Result<Color, ConfigError> {
    Color::from_hex(value).ok_or_else(|| ConfigError::InvalidColor(value.to_string()))
}

/// Decimal or `0x` hexadecimal, with an optional sign.
fn parse_signed(value: &str) -> Result<i64, ConfigError> {
    let invalid = || ConfigError::InvalidInteger(value.to_string());
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    let magnitude = i64::from_str_radix(digits, radix).map_err(|_| ConfigError::OutOfRange(value.to_string()))?;
    Ok(if negative { -magnitude } else { magnitude })
}

pub fn parse_uint(value: &str) -> Result<u32, ConfigError> {
    let parsed = parse_signed(value)?;
    u32::try_from(parsed).map_err(|_| ConfigError::OutOfRange(value.to_string()))
}

pub fn parse_int(value: &str) -> Result<i32, ConfigError> {
    let parsed = parse_signed(value)?;
    i32::try_from(parsed).map_err(|_| ConfigError::OutOfRange(value.to_string()))
}
