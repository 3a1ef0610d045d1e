use std::path::PathBuf;

use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use tracing::info;

use drip_request::ProxyPool;

use crate::{config::Config, runner::WalletRunner, wallets::load_signers};

#[derive(Parser)]
pub struct RunArgs {
    /// Newline delimited private keys
    #[arg(short, long, default_value = "pk.txt")]
    pub keys: PathBuf,
    /// Newline delimited proxies. A missing file means direct connections.
    #[arg(short, long, default_value = "proxy.txt")]
    pub proxies: PathBuf,
    /// Stop after a single pass over the wallets
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    /// Run wallet cycles until stopped. Keys and proxies are reloaded every cycle.
    pub async fn execute(self, config: Config) -> Result<()> {
        info!(
            faucet = config.enable_faucet,
            transfer = config.enable_transfer,
            contract = config.enable_contract_deploy,
            erc20 = config.erc20.enable_erc20,
            nft = config.nft.enable_nft,
            "Starting wallet runner"
        );

        loop {
            let signers = load_signers(&self.keys)?;
            let proxies = ProxyPool::load(&self.proxies)
                .wrap_err_with(|| format!("Failed to read proxy file {:?}", self.proxies))?;
            info!(
                "Loaded {} wallets and {} proxies",
                signers.len(),
                proxies.len()
            );

            let runner = WalletRunner::new(config.clone(), proxies)?;
            runner.run_cycle(&signers).await;

            if self.once {
                return Ok(());
            }
            runner.wait_for_next_cycle().await;
        }
    }
}
