use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FaucetConfig {
    /// Faucet claim endpoint
    pub url: Url,
    /// Page the captcha is solved for, also sent as the request origin
    pub page_url: Url,
    /// Referer header of claim requests, defaults to the page url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<Url>,
    /// hCaptcha site key of the faucet page
    pub site_key: String,
    /// Scrappey api endpoint
    pub solver_url: Url,
    /// Scrappey api key
    pub api_key: String,
    /// Browser user agent sent with claims
    pub user_agent: String,
    /// Captcha solves per claim
    pub captcha_attempts: u32,
    /// Pause between failed captcha solves
    #[serde(with = "humantime_serde")]
    pub captcha_retry_delay: Duration,
    /// Timeout of a single solve request
    #[serde(with = "humantime_serde")]
    pub solver_timeout: Duration,
    /// Block explorer used to print transaction links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<Url>,
}

impl std::fmt::Debug for FaucetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Hide the api key
        f.debug_struct("FaucetConfig")
            .field("url", &self.url.as_str())
            .field("solver", &self.solver_url.host_str().unwrap_or("missing solver host"))
            .field("captcha_attempts", &self.captcha_attempts)
            .finish()
    }
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            url: "https://faucet.evm.testnet.cytonic.com/".parse().unwrap(),
            page_url: "https://www.cytonic.com".parse().unwrap(),
            referer: None,
            site_key: String::new(),
            solver_url: "https://publisher.scrappey.com/api/v1".parse().unwrap(),
            api_key: String::new(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36"
                .into(),
            captcha_attempts: 3,
            captcha_retry_delay: Duration::from_secs(5),
            solver_timeout: Duration::from_secs(120),
            explorer_url: None,
        }
    }
}
