//! Resilient request core: proxy rotation, capped jittered backoff and
//! rule based response classification for flaky, rate limited endpoints.

mod backoff;
pub mod classify;
mod config;
mod executor;
mod proxy;

pub use backoff::RetryBudget;
pub use classify::{classify, EndpointKind, Failure, Outcome, OutcomeTag, Reply, SoftReason};
pub use config::RequestConfig;
pub use executor::{Execution, RequestExecutor, RequestSpec};
pub use proxy::{ProxyEndpoint, ProxyPool};

pub use reqwest::{header, Method, Url};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid proxy {0}: {1}")]
    Proxy(ProxyEndpoint, #[source] reqwest::Error),
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}
