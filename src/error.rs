//! Error types for notegraph.

use thiserror::Error;

/// Errors that can occur while loading data, rendering or writing output
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A template failed to render
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// The configuration is structurally valid but unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// A dataset or todo source could not be read
    #[error("source error: {0}")]
    Source(String),

    /// The file watcher failed
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type for notegraph operations
pub type Result<T> = std::result::Result<T, Error>;
