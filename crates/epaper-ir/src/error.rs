use thiserror::Error;

/// Errors raised while decoding a page model.
#[derive(Error, Debug)]
pub enum PageError {
    /// The payload is not valid JSON.
    #[error("page is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but misses mandatory structure or geometry.
    #[error("malformed page: {0}")]
    Malformed(String),
}

/// Errors raised while splitting a push message envelope.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("empty push message")]
    Empty,

    #[error("push message '{tag}' is truncated")]
    Truncated { tag: char },

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("invalid focus binding: {0}")]
    Binding(serde_json::Error),
}
