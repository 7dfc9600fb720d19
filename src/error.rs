#[derive(Debug, thiserror::Error)]
pub enum CapacityError {
    #[error("Missing configuration key `{0}`")]
    ConfigMissing(&'static str),

    #[error("Invalid value for configuration key `{key}`: {reason}")]
    ConfigInvalid { key: &'static str, reason: String },

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to fetch {url}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out fetching {url}")]
    FetchTimeout { url: String },

    #[error("No script node at `{0}`")]
    ExtractionNotFound(String),

    #[error("Script snippet has no `{0}` marker")]
    MalformedSnippet(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Document `{0}` is corrupt")]
    CorruptDocument(String),

    #[error("Timestamp `{0}` already present in document")]
    DuplicateTimestamp(String),

    #[error("Blob storage error")]
    BlobIoFailed(#[from] BlobIoError),

    #[error("Timed out on blob `{0}`")]
    BlobTimeout(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BlobIoError {
    #[error("Database error")]
    Database(#[from] sqlx::error::Error),

    #[error("Http error")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} for blob `{name}`")]
    Status { name: String, status: u16 },

    #[error("Invalid blob endpoint `{0}`")]
    InvalidEndpoint(String),

    #[error("Invalid rotation state")]
    State(#[from] serde_json::Error),
}
