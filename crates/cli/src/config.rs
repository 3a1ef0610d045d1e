use std::{path::PathBuf, time::Duration};

use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};

use drip_ethereum::{ContractConfig, Erc20Config, EthClient, EthConfig, NftConfig};
use drip_faucet::{FaucetClaimer, FaucetConfig};
use drip_request::{ProxyPool, RequestConfig, RequestExecutor, RetryBudget};

/// Top level config layout
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    pub enable_faucet: bool,
    pub enable_transfer: bool,
    pub enable_contract_deploy: bool,
    /// Applied to the network gas price for every transaction
    pub gas_price_multiplier: f64,
    /// Attempts per request, and per wallet operation
    pub max_retries: u32,
    /// Seconds before the first retry, doubled after each failure
    pub base_wait_time: f64,
    /// Percentage of the balance sent back to the wallet itself
    pub transfer_amount_percentage: f64,
    pub contract: ContractConfig,
    pub erc20: Erc20Config,
    pub nft: NftConfig,
    pub eth: EthConfig,
    pub faucet: FaucetConfig,
    pub request: RequestConfig,
    pub runner: RunnerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_faucet: true,
            enable_transfer: true,
            enable_contract_deploy: true,
            gas_price_multiplier: 1.1,
            max_retries: 5,
            base_wait_time: 10.0,
            transfer_amount_percentage: 1.0,
            contract: ContractConfig::default(),
            erc20: Erc20Config::default(),
            nft: NftConfig::default(),
            eth: EthConfig::default(),
            faucet: FaucetConfig::default(),
            request: RequestConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

/// Pacing of the wallet cycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    #[serde(with = "humantime_serde")]
    pub wallet_pause_min: Duration,
    #[serde(with = "humantime_serde")]
    pub wallet_pause_max: Duration,
    /// Sleep between two full passes over the wallets
    #[serde(with = "humantime_serde")]
    pub cycle_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            wallet_pause_min: Duration::from_secs(5),
            wallet_pause_max: Duration::from_secs(15),
            cycle_interval: Duration::from_secs(8 * 60 * 60),
        }
    }
}

impl Config {
    const DEFAULT_PATH: &str = "~/.config/drip/config.toml";

    /// Load the config, filling in missing values with defaults, and writing to disk after.
    pub fn load(path: Option<impl Into<PathBuf>>) -> Result<Self> {
        let path = path.map(|v| v.into()).unwrap_or(Self::DEFAULT_PATH.into());
        let path = path.resolve().to_path_buf();

        // Read config or get the default. A file that exists but fails to parse
        // is an error, so it never gets overwritten with defaults.
        let config = match std::fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s)
                .wrap_err_with(|| format!("Failed to parse configuration {path:?}"))?,
            Err(_) => Self::default(),
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    bail!("Failed to create configuration directory {parent:?}: {e}");
                }
            }
        }

        // Write config (with potentially new items)
        if let Err(e) = std::fs::write(&path, toml::to_string_pretty(&config)?) {
            bail!("Failed to write configuration to {path:?}: {e}");
        }

        Ok(config)
    }

    /// Retry budget shared by requests and wallet operations
    pub fn budget(&self) -> RetryBudget {
        RetryBudget::new(self.max_retries, self.base_wait_time)
    }

    pub fn eth_client(&self) -> EthClient {
        EthClient::new(self.eth.clone())
            .with_gas_price_multiplier(self.gas_price_multiplier)
            .with_transfer_percentage(self.transfer_amount_percentage)
    }

    /// Faucet claimer routing its requests through the given proxies
    pub fn faucet_claimer(&self, proxies: ProxyPool) -> Result<FaucetClaimer> {
        let executor = RequestExecutor::new(self.request.clone(), proxies)?;
        let claimer = FaucetClaimer::new(self.faucet.clone(), executor, self.budget())
            .wrap_err("Faucet is enabled but not configured")?;
        Ok(claimer)
    }
}
