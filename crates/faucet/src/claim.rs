use std::fmt;

use alloy_primitives::Address;
use drip_request::{
    header::{
        HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, REFERER,
        USER_AGENT,
    },
    EndpointKind, Outcome, Reply, RequestExecutor, RequestSpec, RetryBudget,
};
use serde_json::json;
use tracing::{error, info, instrument, trace, warn};

use crate::{
    captcha::{CaptchaSolver, CaptchaToken},
    FaucetConfig, FaucetError,
};

const CAPTCHA_HEADER: HeaderName = HeaderName::from_static("h-captcha-response");

/// Result of one claim attempt for an address
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimStatus {
    Claimed { tx_hash: String },
    /// Address is in its cooldown window
    RateLimited { reason: String },
    InvalidCaptcha,
    NoCaptcha,
    NoResponse,
    Unexpected { body: String },
}

impl ClaimStatus {
    /// True when the address needs no further claim attempts for now
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Claimed { .. } | ClaimStatus::RateLimited { .. }
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimStatus::Claimed { tx_hash } => write!(f, "claimed in {tx_hash}"),
            ClaimStatus::RateLimited { reason } => write!(f, "rate limited: {reason}"),
            ClaimStatus::InvalidCaptcha => f.write_str("invalid captcha"),
            ClaimStatus::NoCaptcha => f.write_str("no captcha token"),
            ClaimStatus::NoResponse => f.write_str("no response from faucet"),
            ClaimStatus::Unexpected { body } => write!(f, "unexpected response: {body}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ClaimVerdict {
    InvalidCaptcha,
    RateLimited,
    Claimed,
}

/// Rule on a string field of the faucet's json body
struct ClaimRule {
    name: &'static str,
    field: &'static str,
    matches: fn(&str) -> bool,
    verdict: ClaimVerdict,
}

const CLAIM_RULES: &[ClaimRule] = &[
    ClaimRule {
        name: "invalid-captcha",
        field: "error",
        matches: |text| text.contains("Invalid Captcha"),
        verdict: ClaimVerdict::InvalidCaptcha,
    },
    ClaimRule {
        name: "error-cooldown",
        field: "error",
        matches: |text| text.contains("hour") || text.contains("wait"),
        verdict: ClaimVerdict::RateLimited,
    },
    ClaimRule {
        name: "msg-cooldown",
        field: "msg",
        matches: |text| text.contains("exceeded the rate limit") || text.contains("wait"),
        verdict: ClaimVerdict::RateLimited,
    },
    ClaimRule {
        name: "tx-hash",
        field: "msg",
        matches: |text| text.contains("hash:") || text.starts_with("0x"),
        verdict: ClaimVerdict::Claimed,
    },
];

/// Interpret a terminal faucet response. First matching rule wins, anything
/// unmatched is unexpected.
pub fn interpret_claim(reply: &Reply) -> ClaimStatus {
    for rule in CLAIM_RULES {
        let Some(text) = reply.field(rule.field) else {
            continue;
        };
        if !(rule.matches)(&text) {
            continue;
        }
        trace!(rule = rule.name, "claim rule matched");
        return match rule.verdict {
            ClaimVerdict::InvalidCaptcha => ClaimStatus::InvalidCaptcha,
            ClaimVerdict::RateLimited => ClaimStatus::RateLimited { reason: text },
            ClaimVerdict::Claimed => ClaimStatus::Claimed {
                tx_hash: extract_tx_hash(&text),
            },
        };
    }
    ClaimStatus::Unexpected {
        body: reply.body.clone(),
    }
}

/// Text after `hash:` (also covers `Txhash:`), or the whole message for a bare hash
fn extract_tx_hash(msg: &str) -> String {
    match msg.split_once("hash:") {
        Some((_, hash)) => hash.trim().to_string(),
        None => msg.trim().to_string(),
    }
}

/// Solves a captcha and claims faucet funds for an address.
#[derive(Clone, Debug)]
pub struct FaucetClaimer {
    config: FaucetConfig,
    executor: RequestExecutor,
    solver: CaptchaSolver,
    budget: RetryBudget,
}

impl FaucetClaimer {
    pub fn new(
        config: FaucetConfig,
        executor: RequestExecutor,
        budget: RetryBudget,
    ) -> Result<Self, FaucetError> {
        if config.api_key.is_empty() {
            return Err(FaucetError::MissingApiKey);
        }
        if config.site_key.is_empty() {
            return Err(FaucetError::MissingSiteKey);
        }
        let solver = CaptchaSolver::new(&config, executor.clone(), budget);
        Ok(Self {
            config,
            executor,
            solver,
            budget,
        })
    }

    pub fn solver(&self) -> &CaptchaSolver {
        &self.solver
    }

    /// Claim funds for an address. See [`ClaimStatus::is_done`] for whether to retry.
    #[instrument(skip(self))]
    pub async fn claim(&self, address: Address) -> ClaimStatus {
        let Some(token) = self.solve_with_retries().await else {
            error!("Failed to solve captcha after multiple attempts");
            return ClaimStatus::NoCaptcha;
        };

        info!("Claiming faucet with valid captcha token");
        let Some(spec) = self.claim_request(address, &token) else {
            error!("Captcha token is not a valid header value");
            return ClaimStatus::NoCaptcha;
        };
        let execution = self
            .executor
            .execute(&spec, &self.budget, token.proxy.clone())
            .await;

        let status = match execution.outcome {
            Outcome::SoftSuccess(reply, reason) => ClaimStatus::RateLimited {
                reason: reply
                    .field("msg")
                    .or_else(|| reply.field("error"))
                    .unwrap_or_else(|| reason.to_string()),
            },
            Outcome::Success(reply) => {
                info!(status = reply.status, body = %reply.body, "Faucet response");
                interpret_claim(&reply)
            }
            Outcome::RetryableFailure(failure) => {
                warn!("{failure}");
                ClaimStatus::NoResponse
            }
            Outcome::FatalFailure(reason) => ClaimStatus::Unexpected { body: reason },
        };
        self.report(&status);
        status
    }

    /// Up to `captcha_attempts` solves with a fixed pause after each failure
    async fn solve_with_retries(&self) -> Option<CaptchaToken> {
        let attempts = self.config.captcha_attempts.max(1);
        for attempt in 1..=attempts {
            info!("Captcha attempt {attempt}/{attempts}");
            if let Some(token) = self.solver.solve().await {
                return Some(token);
            }
            if attempt < attempts {
                warn!("Captcha attempt {attempt} failed, waiting before retry");
                tokio::time::sleep(self.config.captcha_retry_delay).await;
            }
        }
        None
    }

    /// Browser-like claim request carrying the captcha token. None when the
    /// token can't be sent as a header.
    pub fn claim_request(&self, address: Address, token: &CaptchaToken) -> Option<RequestSpec> {
        let captcha = HeaderValue::from_str(&token.value).ok()?;
        let origin = self.config.page_url.origin().ascii_serialization();
        let referer = self
            .config
            .referer
            .as_ref()
            .unwrap_or(&self.config.page_url)
            .as_str();

        let mut spec = RequestSpec::post(self.config.url.clone(), EndpointKind::FaucetClaim)
            .json(json!({ "address": address.to_checksum(None) }))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .header(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"))
            .header(CAPTCHA_HEADER, captcha);
        let dynamic = [
            (USER_AGENT, self.config.user_agent.as_str()),
            (ORIGIN, origin.as_str()),
            (REFERER, referer),
        ];
        for (name, value) in dynamic {
            match HeaderValue::from_str(value) {
                Ok(value) => spec = spec.header(name, value),
                Err(_) => warn!(header = %name, "Skipping header with invalid characters"),
            }
        }
        Some(spec)
    }

    fn report(&self, status: &ClaimStatus) {
        match status {
            ClaimStatus::Claimed { tx_hash } => match &self.config.explorer_url {
                Some(explorer) => info!(
                    "Success! Transaction: {}/tx/{tx_hash}",
                    explorer.as_str().trim_end_matches('/')
                ),
                None => info!("Success! Transaction: {tx_hash}"),
            },
            ClaimStatus::RateLimited { reason } => {
                warn!("Rate limited, moving to next operation: {reason}")
            }
            ClaimStatus::InvalidCaptcha => error!("Invalid captcha response received"),
            ClaimStatus::NoCaptcha | ClaimStatus::NoResponse => error!("Claim failed: {status}"),
            ClaimStatus::Unexpected { body } => error!("Unexpected response: {body}"),
        }
    }
}
