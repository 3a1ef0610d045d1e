use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RequestConfig {
    /// Timeout for requests that don't set their own
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,
    /// Timeout for faucet claims
    #[serde(with = "humantime_serde")]
    pub faucet_timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            faucet_timeout: Duration::from_secs(180),
        }
    }
}
