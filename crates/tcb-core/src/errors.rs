use std::path::PathBuf;

/// Core error type for the bot.
///
/// Adapter crates map their transport/HTTP errors into `External` so the router
/// can log and swallow handler failures uniformly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("counter file {path} is missing key `{key}`")]
    MissingCounter { path: PathBuf, key: String },

    #[error("invalid counter file: {path}: {reason}")]
    InvalidCounterFile { path: PathBuf, reason: String },

    #[error("command registry error: {0}")]
    Registry(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
