use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ErddapError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("url {url} is not reachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("failed to load server registry: {0}")]
    RegistryFetch(String),

    #[error("invalid dataset {name}: {message}")]
    DatasetParse { name: String, message: String },

    #[error("unrecognized date: {0}")]
    DateParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
