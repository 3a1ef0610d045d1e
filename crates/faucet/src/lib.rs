//! Captcha gated faucet claims on top of the resilient request core.

mod captcha;
mod claim;
mod config;

pub use captcha::{extract_token, CaptchaSolver, CaptchaToken};
pub use claim::{interpret_claim, ClaimStatus, FaucetClaimer};
pub use config::FaucetConfig;

#[derive(Debug, thiserror::Error)]
pub enum FaucetError {
    #[error("No captcha solver api key configured")]
    MissingApiKey,
    #[error("No hCaptcha site key configured")]
    MissingSiteKey,
}
