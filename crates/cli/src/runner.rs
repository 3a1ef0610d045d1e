use std::{future::Future, time::Duration};

use alloy::signers::local::PrivateKeySigner;
use chrono::{TimeDelta, Utc};
use color_eyre::Result;
use rand::Rng;
use tracing::{error, info, info_span, warn, Instrument};

use drip_ethereum::EthClient;
use drip_faucet::FaucetClaimer;
use drip_request::{ProxyPool, RetryBudget};

use crate::config::{Config, RunnerConfig};

/// Run `op` until it reports success or the budget is spent. Waits between
/// attempts are the unjittered backoff ceiling. Returns whether `op` succeeded.
pub async fn with_retries<F, Fut>(label: &str, budget: &RetryBudget, mut op: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let attempts = budget.max_attempts.max(1);
    for attempt in 1..=attempts {
        if op().await {
            return true;
        }
        if attempt < attempts {
            let wait = budget.ceiling(attempt);
            warn!(
                "{label} failed (attempt {attempt}/{attempts}), retrying in {}s",
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
        }
    }
    error!("{label} failed after {attempts} attempts, moving on");
    false
}

/// Sequential pass over every wallet: faucet, self transfer, then deployments.
pub struct WalletRunner {
    config: Config,
    budget: RetryBudget,
    eth: EthClient,
    claimer: Option<FaucetClaimer>,
}

impl WalletRunner {
    pub fn new(config: Config, proxies: ProxyPool) -> Result<Self> {
        let claimer = if config.enable_faucet {
            Some(config.faucet_claimer(proxies)?)
        } else {
            None
        };
        Ok(Self {
            budget: config.budget(),
            eth: config.eth_client(),
            claimer,
            config,
        })
    }

    pub async fn run_cycle(&self, signers: &[PrivateKeySigner]) {
        let total = signers.len();
        for (idx, signer) in signers.iter().enumerate() {
            let n = idx + 1;
            self.run_wallet(signer, n, total)
                .instrument(info_span!("wallet", n))
                .await;

            if n < total {
                let pause = pause_between(&self.config.runner, &mut rand::rng());
                info!("Waiting {}s before next wallet", pause.as_secs());
                tokio::time::sleep(pause).await;
            }
        }
        info!("Processed {total} wallets");
    }

    async fn run_wallet(&self, signer: &PrivateKeySigner, n: usize, total: usize) {
        let address = signer.address();
        info!("Processing wallet {n}/{total}: {address}");

        if let Some(claimer) = &self.claimer {
            with_retries("Faucet claim", &self.budget, || async move {
                claimer.claim(address).await.is_done()
            })
            .await;
        }

        if self.config.enable_transfer {
            let eth = &self.eth;
            with_retries("Transfer", &self.budget, || async move {
                match eth.transfer_to_self(signer).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Transfer failed: {e}");
                        false
                    }
                }
            })
            .await;
        }

        if self.config.enable_contract_deploy {
            if let Err(e) = self.eth.run_contract_flow(signer, &self.config.contract).await {
                error!("Contract deployment failed: {e}");
            }
        }
        if self.config.erc20.enable_erc20 {
            if let Err(e) = self.eth.run_erc20_flow(signer, &self.config.erc20).await {
                error!("ERC20 flow failed: {e}");
            }
        }
        if self.config.nft.enable_nft {
            if let Err(e) = self.eth.run_nft_flow(signer, &self.config.nft).await {
                error!("NFT flow failed: {e}");
            }
        }
    }

    pub async fn wait_for_next_cycle(&self) {
        let interval = self.config.runner.cycle_interval;
        let next = TimeDelta::from_std(interval)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        match next {
            Some(next) => info!(
                "Cycle complete, next run at {}",
                next.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => info!("Cycle complete, next run in {}s", interval.as_secs()),
        }
        tokio::time::sleep(interval).await;
    }
}

/// Uniform pause within the configured range, whichever bound is given first
fn pause_between<R: Rng + ?Sized>(config: &RunnerConfig, rng: &mut R) -> Duration {
    let (lo, hi) = if config.wallet_pause_min <= config.wallet_pause_max {
        (config.wallet_pause_min, config.wallet_pause_max)
    } else {
        (config.wallet_pause_max, config.wallet_pause_min)
    };
    rng.random_range(lo..=hi)
}
