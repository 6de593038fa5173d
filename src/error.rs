//! Error types shared across the picker.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single configuration problem. File parsing counts these per line;
/// the command line treats the first one as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Bad config option \"{0}\"")]
    UnknownOption(String),
    #[error("Missing option")]
    MissingOption,
    #[error("Missing value for option \"{0}\"")]
    MissingValue(String),
    #[error("Invalid boolean value \"{0}\"")]
    InvalidBool(String),
    #[error("Invalid anchor \"{0}\"")]
    InvalidAnchor(String),
    #[error("Invalid color string \"{0}\"")]
    InvalidColor(String),
    #[error("Failed to parse \"{0}\" as integer")]
    InvalidInteger(String),
    #[error("Value \"{0}\" out of range")]
    OutOfRange(String),
    #[error("Too many config file errors (>{0}), giving up")]
    TooManyErrors(usize),
    #[error("Config file too large, not parsing")]
    FileTooLarge,
    #[error("Failed to read config file {path}: {message}")]
    Unreadable { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is not a PSF font")]
    NotPsf(PathBuf),
    #[error("font {path} is truncated or malformed: {reason}")]
    Malformed { path: PathBuf, reason: &'static str },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("no controlling terminal available for keyboard input")]
    NoTerminal,
    #[error("window size {width}x{height} is too small")]
    WindowTooSmall { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
