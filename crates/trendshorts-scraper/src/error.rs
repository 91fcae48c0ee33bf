use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no embedded initial data found in page from {context}")]
    InitialDataMissing { context: String },

    #[error("extraction root is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },
}

/// Failure of a single metadata lookup. Always scoped to one video.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to launch metadata provider: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("metadata lookup for {video_id} timed out after {timeout_secs}s")]
    Timeout { video_id: String, timeout_secs: u64 },

    #[error("metadata provider exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("metadata for {video_id} is not valid JSON: {source}")]
    Deserialize {
        video_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("video {video_id} is unavailable")]
    Unavailable { video_id: String },

    #[error("provider answered for {returned} when asked for {requested}")]
    IdMismatch { requested: String, returned: String },
}
