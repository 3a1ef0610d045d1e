use std::time::Duration;

use drip_faucet::{FaucetClaimer, FaucetConfig};
use drip_request::{ProxyPool, RequestConfig, RequestExecutor, RetryBudget};
use tracing::Level;
use wiremock::MockServer;

pub const TOKEN: &str = "P1_eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9.test";

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Retry budget that never sleeps
pub fn zero_budget(max_attempts: u32) -> RetryBudget {
    RetryBudget::new(max_attempts, 0.0)
}

pub fn executor() -> RequestExecutor {
    executor_with(ProxyPool::default())
}

pub fn executor_with(proxies: ProxyPool) -> RequestExecutor {
    RequestExecutor::new(RequestConfig::default(), proxies).unwrap()
}

pub fn url(server: &MockServer, path: &str) -> url::Url {
    format!("{}{path}", server.uri()).parse().unwrap()
}

/// Faucet and solver both pointed at the mock server, `/claim` and `/solver`
pub fn faucet_config(server: &MockServer) -> FaucetConfig {
    FaucetConfig {
        url: url(server, "/claim"),
        solver_url: url(server, "/solver"),
        site_key: "test-site-key".into(),
        api_key: "test-api-key".into(),
        captcha_retry_delay: Duration::ZERO,
        ..Default::default()
    }
}

pub fn claimer(server: &MockServer) -> FaucetClaimer {
    FaucetClaimer::new(faucet_config(server), executor(), zero_budget(3)).unwrap()
}

/// Port that refuses connections
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
