use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;

use crate::{config::Config, wallets::load_signers};

#[derive(Parser)]
pub struct AddressArgs {
    /// Newline delimited private keys
    #[arg(short, long, default_value = "pk.txt")]
    pub keys: PathBuf,
}

impl AddressArgs {
    pub async fn execute(self, _config: Config) -> Result<()> {
        for (idx, signer) in load_signers(&self.keys)?.iter().enumerate() {
            println!("{}: {}", idx + 1, signer.address());
        }
        Ok(())
    }
}
