use thiserror::Error;

/// Failure of one upstream fetch cycle. All variants are non-fatal: the
/// poll loop logs them and waits for the next tick.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("upstream rate limit hit")]
    RateLimited,

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload missing tracked asset: {0}")]
    MissingAsset(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invalid allowed origin: {0}")]
    InvalidOrigin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
