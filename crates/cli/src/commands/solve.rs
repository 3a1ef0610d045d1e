use std::path::PathBuf;

use clap::Parser;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};

use drip_request::ProxyPool;

use crate::config::Config;

#[derive(Parser)]
pub struct SolveArgs {
    /// Newline delimited proxies passed to the solver
    #[arg(short, long, default_value = "proxy.txt")]
    pub proxies: PathBuf,
}

impl SolveArgs {
    pub async fn execute(self, config: Config) -> Result<()> {
        let proxies = ProxyPool::load(&self.proxies)
            .wrap_err_with(|| format!("Failed to read proxy file {:?}", self.proxies))?;
        let claimer = config.faucet_claimer(proxies)?;

        let token = claimer
            .solver()
            .solve()
            .await
            .ok_or_else(|| eyre!("Solver returned no captcha token"))?;
        match &token.proxy {
            Some(proxy) => println!("{}... (via {proxy})", token.preview()),
            None => println!("{}...", token.preview()),
        }
        Ok(())
    }
}
