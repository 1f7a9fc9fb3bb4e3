use std::path::PathBuf;
use thiserror::Error;

/// jsonext unified error type
#[derive(Error, Debug)]
pub enum JsonExtError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read config file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Framework error: {0}")]
    Framework(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Argument error: {0}")]
    Args(#[from] clap::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(String),
}

pub type JsonExtResult<T> = Result<T, JsonExtError>;
