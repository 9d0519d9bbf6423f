//! Error types shared across the writeup crates.

use miette::Diagnostic;

/// Errors raised while reading or writing configuration files.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    #[diagnostic(code(writeup::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format {extension:?}, expected .json or .toml")]
    #[diagnostic(
        code(writeup::config::format),
        help("rename the file with a .json or .toml extension")
    )]
    UnsupportedFormat { extension: Option<String> },

    #[error(transparent)]
    #[diagnostic_source]
    Serde(#[from] SerDeError),
}

/// Errors from the object storage collaborator.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    /// The backend answered but refused the upload.
    #[error("upload of {path} rejected: {message}")]
    #[diagnostic(code(writeup::storage::rejected))]
    Rejected { path: String, message: String },

    /// The request never completed.
    #[error("storage transport error: {0}")]
    #[diagnostic(code(writeup::storage::transport))]
    Transport(String),
}

/// Serialization/deserialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error(transparent)]
    #[diagnostic(code(writeup::serde::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(writeup::serde::toml))]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(writeup::serde::toml))]
    TomlSer(#[from] toml::ser::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(SerDeError::Json(err))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde(SerDeError::TomlDe(err))
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serde(SerDeError::TomlSer(err))
    }
}
