use crate::rail::cache::CacheError;

/// Why one external call produced nothing usable.
///
/// Never surfaced to users; the resolver treats every variant as a failed
/// candidate and moves on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid service url: {0}")]
    Url(String),

    #[error("no route: {0}")]
    NoRoute(String),

    #[error("unexpected response body: {0}")]
    Body(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("could not set up external service client: {0}")]
    Client(#[from] FetchError),
}

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
