use std::path::PathBuf;

use alloy::primitives::Address;
use clap::Parser;
use color_eyre::{
    eyre::{ensure, WrapErr},
    Result,
};

use drip_request::ProxyPool;

use crate::config::Config;

#[derive(Parser)]
pub struct ClaimArgs {
    /// Address receiving the faucet funds
    pub address: Address,
    /// Newline delimited proxies
    #[arg(short, long, default_value = "proxy.txt")]
    pub proxies: PathBuf,
}

impl ClaimArgs {
    pub async fn execute(self, config: Config) -> Result<()> {
        let proxies = ProxyPool::load(&self.proxies)
            .wrap_err_with(|| format!("Failed to read proxy file {:?}", self.proxies))?;
        let claimer = config.faucet_claimer(proxies)?;

        let status = claimer.claim(self.address).await;
        println!("{status}");
        ensure!(status.is_done(), "Claim for {} did not go through", self.address);
        Ok(())
    }
}
