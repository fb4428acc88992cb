#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Corrupt store file '{key}': {reason}")]
    CorruptStore { key: String, reason: String },

    #[error("Offline mode is enabled: {0}")]
    Offline(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
