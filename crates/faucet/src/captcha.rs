use std::time::Duration;

use drip_request::{
    header::{HeaderValue, CONTENT_TYPE},
    EndpointKind, Outcome, ProxyEndpoint, RequestExecutor, RequestSpec, RetryBudget,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use url::Url;

use crate::FaucetConfig;

/// Tokens this short are error strings, not captcha solutions
const MIN_TOKEN_LEN: usize = 20;

/// Solved captcha and the proxy the solver ran behind
#[derive(Clone, Debug)]
pub struct CaptchaToken {
    pub value: String,
    pub proxy: Option<ProxyEndpoint>,
}

impl CaptchaToken {
    /// Short prefix, safe to log
    pub fn preview(&self) -> String {
        self.value.chars().take(15).collect()
    }
}

/// Obtains hCaptcha tokens from the Scrappey solving service.
#[derive(Clone, Debug)]
pub struct CaptchaSolver {
    executor: RequestExecutor,
    budget: RetryBudget,
    solver_url: Url,
    api_key: String,
    page_url: Url,
    site_key: String,
    timeout: Duration,
}

impl CaptchaSolver {
    pub fn new(config: &FaucetConfig, executor: RequestExecutor, budget: RetryBudget) -> Self {
        Self {
            executor,
            budget,
            solver_url: config.solver_url.clone(),
            api_key: config.api_key.clone(),
            page_url: config.page_url.clone(),
            site_key: config.site_key.clone(),
            timeout: config.solver_timeout,
        }
    }

    /// Solver request: fetch the page without rendering it, run the hcaptcha
    /// browser action and return the token through javascript.
    pub fn request(&self, proxy: Option<&ProxyEndpoint>) -> RequestSpec {
        let mut body = json!({
            "cmd": "request.get",
            "url": self.page_url.as_str(),
            "dontLoadMainSite": true,
            "filter": ["javascriptReturn"],
            "browserActions": [{
                "type": "solve_captcha",
                "captcha": "hcaptcha",
                "captchaData": { "sitekey": self.site_key },
            }],
        });
        if let Some(proxy) = proxy {
            body["proxy"] = proxy.as_str().into();
        }

        RequestSpec::post(self.solver_url.clone(), EndpointKind::CaptchaSolver)
            .query("key", &self.api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body)
            .timeout(self.timeout)
    }

    /// Solve one captcha, retrying transient solver failures within the budget
    #[instrument(skip(self))]
    pub async fn solve(&self) -> Option<CaptchaToken> {
        info!("Solving hCaptcha");
        let proxy = self.executor.proxies().pick_random();
        let spec = self.request(proxy.as_ref());

        let execution = self.executor.execute(&spec, &self.budget, None).await;
        let reply = match execution.outcome {
            Outcome::Success(reply) => reply,
            outcome => {
                warn!(
                    "Failed to solve captcha after {} attempts: {:?}",
                    execution.attempts,
                    outcome.tag()
                );
                return None;
            }
        };
        if reply.status != 200 {
            warn!(status = reply.status, body = %reply.body, "Captcha solver rejected the request");
            return None;
        }

        let Some(body) = reply.json() else {
            warn!(body = %reply.body, "Captcha solver returned a non json body");
            return None;
        };
        match extract_token(&body) {
            Some(value) => {
                let token = CaptchaToken { value, proxy };
                info!("Obtained captcha token starting with {}...", token.preview());
                Some(token)
            }
            None => {
                warn!(response = %body, "Could not find token in expected locations");
                None
            }
        }
    }
}

/// Search `solution.javascriptReturn[0]`, `solution.token` and `token`, in
/// that order, for a plausible token.
pub fn extract_token(body: &Value) -> Option<String> {
    [
        body.pointer("/solution/javascriptReturn/0"),
        body.pointer("/solution/token"),
        body.get("token"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|token| token.len() > MIN_TOKEN_LEN)
    .map(str::to_owned)
}
