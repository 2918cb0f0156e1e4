use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid article URL: {0}")]
    Validation(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Link graph not built. Build it to the required depth before analysing")]
    NotBuilt,

    #[error("Missing page region '{region}' in {url}")]
    Structure { url: String, region: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// Per-page failures that a build or analysis absorbs instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::HttpError(_)
                | ScanError::Fetch { .. }
                | ScanError::Timeout { .. }
                | ScanError::Structure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
