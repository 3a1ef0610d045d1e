use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EthConfig {
    /// Url for rpc commands
    pub rpc: Url,
}

impl std::fmt::Debug for EthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Hide potentially sensitive query parameters
        f.debug_struct("EthConfig")
            .field("rpc", &self.rpc.host_str().unwrap_or("missing rpc host"))
            .finish()
    }
}

impl Default for EthConfig {
    fn default() -> Self {
        Self {
            rpc: "http://localhost:8545".parse().unwrap(),
        }
    }
}

/// Plain contract deployment
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ContractConfig {
    /// Compiled artifact holding the creation bytecode
    pub artifact: PathBuf,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            artifact: "artifacts/Contract.json".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Erc20Config {
    pub enable_erc20: bool,
    pub artifact: PathBuf,
    /// Whole tokens minted to the wallet
    pub mint_amount: u64,
    /// Whole tokens burned afterwards
    pub burn_amount: u64,
}

impl Default for Erc20Config {
    fn default() -> Self {
        Self {
            enable_erc20: true,
            artifact: "artifacts/ERC20Token.json".into(),
            mint_amount: 1000,
            burn_amount: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct NftConfig {
    pub enable_nft: bool,
    pub artifact: PathBuf,
    pub mint_count: u32,
}

impl Default for NftConfig {
    fn default() -> Self {
        Self {
            enable_nft: true,
            artifact: "artifacts/NFTCollection.json".into(),
            mint_count: 1,
        }
    }
}
