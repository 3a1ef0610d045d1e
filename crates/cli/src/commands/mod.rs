use clap::Subcommand;
use color_eyre::Result;

use crate::config::Config;

mod address;
mod claim;
pub mod run;
mod solve;

#[derive(Subcommand)]
pub enum Command {
    /// Run the wallet cycle: faucet claim, self transfer and deployments for every key.
    Run(run::RunArgs),
    /// Claim faucet funds for a single address.
    Claim(claim::ClaimArgs),
    /// Solve one captcha and print the start of the token.
    Solve(solve::SolveArgs),
    /// Print the address of every loaded key.
    Address(address::AddressArgs),
}

impl Command {
    /// Run the given command
    pub fn execute(self, config: Config) -> Result<()> {
        tokio::runtime::Runtime::new()?.block_on(async move {
            match self {
                Command::Run(args) => args.execute(config).await,
                Command::Claim(args) => args.execute(config).await,
                Command::Solve(args) => args.execute(config).await,
                Command::Address(args) => args.execute(config).await,
            }
        })
    }
}
