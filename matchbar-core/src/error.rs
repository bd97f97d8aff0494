//! Typed error handling for matchbar.
//!
//! Every failure the reporter can hit is a variant here, so hosts can match on
//! it and the status label can be rendered from it without string sniffing.

use std::path::PathBuf;
use thiserror::Error;

use crate::status::{DisplayState, Icon};

/// Main error type for matchbar operations.
#[derive(Error, Debug)]
pub enum MatchbarError {
    /// No pattern stored in the settings.
    #[error("Pattern not configured")]
    PatternNotConfigured,

    /// Neither a configured target nor an active document could be resolved.
    #[error("No file specified")]
    NoFileSpecified,

    /// A relative path was given but no workspace root is open.
    #[error("No workspace is open")]
    NoWorkspace,

    /// Target file does not exist on disk.
    #[error("File not found: {name}")]
    FileNotFound {
        path: PathBuf,
        /// Name as the user configured it (or the active document's file name)
        name: String,
    },

    /// Pattern failed to compile.
    #[error("{message}")]
    InvalidPattern { message: String },

    /// I/O error when reading the target file
    #[error("{message}")]
    Read {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Settings file could not be read or written.
    #[error("Settings error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided by a host
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl MatchbarError {
    /// Create a read error with path context.
    pub fn read(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a file-not-found error.
    pub fn file_not_found(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::FileNotFound {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Create an invalid-pattern error from a regex compile failure.
    ///
    /// Syntax errors from `regex` span several lines (pattern, caret, message);
    /// only the trailing `error:` line is kept so the label stays on one line.
    /// The pattern is echoed above it, so the search runs from the end.
    pub fn invalid_pattern(err: &regex::Error) -> Self {
        let full = err.to_string();
        let message = full
            .lines()
            .rev()
            .map(str::trim)
            .find_map(|line| line.strip_prefix("error:"))
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                full.lines()
                    .next()
                    .unwrap_or("invalid pattern")
                    .trim()
                    .to_string()
            });
        Self::InvalidPattern { message }
    }

    /// Create a settings error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Display state the status label lands in when evaluation ends here.
    pub fn display_state(&self) -> DisplayState {
        match self {
            Self::PatternNotConfigured | Self::NoFileSpecified | Self::NoWorkspace => {
                DisplayState::Unconfigured
            }
            _ => DisplayState::Error,
        }
    }

    /// Icon shown next to the label for this error.
    pub fn icon(&self) -> Icon {
        match self.display_state() {
            DisplayState::Error => Icon::Error,
            _ => Icon::Regex,
        }
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::FileNotFound { path, .. } => Some(path),
            Self::Read { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for matchbar results.
pub type MatchbarResult<T> = Result<T, MatchbarError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> MatchbarResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> MatchbarResult<T> {
        self.map_err(|e| MatchbarError::read(path, e))
    }
}
