use std::path::PathBuf;

/// Failures of the local forecast store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Forecast store at {} is unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to create or upgrade forecast schema: {0}")]
    Schema(#[source] rusqlite::Error),
    #[error("Failed to insert into {table}: {source}")]
    Insert {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to query forecast store: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Everything that can go wrong between asking for a forecast and having it stored.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Forecast request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected forecast payload: {0}")]
    Parse(String),
    #[error("Forecast worker did not complete: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
