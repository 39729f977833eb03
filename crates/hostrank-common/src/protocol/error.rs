use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostrankError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Invalid host config: {0}")]
    InvalidHostConfig(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Region already registered: {0}")]
    DuplicateRegion(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostrankError {
    /// Whether a later attempt against the same endpoint may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HostrankError::Transport(_)
                | HostrankError::Timeout(_)
                | HostrankError::HttpStatus(_)
                | HostrankError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HostrankError>;
