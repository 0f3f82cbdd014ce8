use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in the `rewriter` application.
///
/// Build-time variants (`MalformedRule`, `InvalidPattern`) invalidate the whole
/// rule set and are fatal to a run. Everything else is scoped to a single
/// dictionary, file or directory entry and is reported without stopping the
/// remaining targets.
#[derive(Error, Debug)]
pub enum Error {
    /// A `--change` argument without the `:` separator.
    #[error("malformed change '{0}': expected \"pattern:replacement\"")]
    MalformedRule(String),

    /// A pattern that the regex engine refused to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// A dictionary source that could not be loaded.
    #[error("could not load dictionary {source_name}: {reason}")]
    DictionaryLoad { source_name: String, reason: String },

    /// A target file that does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// A target file that exists but could not be read or written.
    #[error("could not access {path}: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The transformed copy was written but could not be moved over the original.
    #[error("could not replace {original}; transformed output kept at {written}: {source}")]
    ReplaceFailed {
        original: PathBuf,
        written: PathBuf,
        source: std::io::Error,
    },

    /// A unit of text could not be transformed.
    #[error("could not transform {path}: {reason}")]
    Transform { path: PathBuf, reason: String },

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error related to file system I/O outside a specific target.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient type alias for `Result<T, rewriter::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps an I/O failure on `path` to the not-found or access variant.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path)
        } else {
            Error::FileAccess { path, source }
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}
