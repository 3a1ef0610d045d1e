use std::path::Path;

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{utils::format_ether, Address, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{RpcError, TransportErrorKind},
};
use tracing::{debug, info, instrument};

mod config;
pub mod contracts;

pub use config::{ContractConfig, Erc20Config, EthConfig, NftConfig};
use contracts::{load_bytecode, IMintableNft, IMintableToken};

/// Gas used by a plain value transfer
pub const TRANSFER_GAS: u64 = 21_000;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("RPC Error: {0:?}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    #[error("Contract call failed: {0:?}")]
    Contract(#[from] alloy::contract::Error),
    #[error("Failed to watch pending transaction: {0}")]
    Pending(#[from] alloy::providers::PendingTransactionError),
    #[error("Invalid artifact {}: {reason}", path.display())]
    Artifact {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("Balance of {0} wei can't cover a transfer and its gas")]
    InsufficientBalance(U256),
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
    #[error("Deployment {0} produced no contract address")]
    NoContractAddress(TxHash),
}

/// Wallet operations against the testnet rpc. Each call builds a provider for
/// the wallet it acts on.
#[derive(Clone, Debug)]
pub struct EthClient {
    config: EthConfig,
    gas_price_multiplier: f64,
    transfer_percentage: f64,
}

impl EthClient {
    pub fn new(config: EthConfig) -> Self {
        debug!(?config);
        Self {
            config,
            gas_price_multiplier: 1.0,
            transfer_percentage: 1.0,
        }
    }

    pub fn with_gas_price_multiplier(mut self, multiplier: f64) -> Self {
        self.gas_price_multiplier = multiplier;
        self
    }

    /// Percentage of the balance moved by [`EthClient::transfer_to_self`]
    pub fn with_transfer_percentage(mut self, percentage: f64) -> Self {
        self.transfer_percentage = percentage;
        self
    }

    /// Provider signing with the given wallet
    pub fn wallet_provider(&self, signer: &PrivateKeySigner) -> impl Provider {
        ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.config.rpc.clone())
    }

    /// Network gas price scaled by the configured multiplier
    async fn gas_price(&self, provider: &impl Provider) -> Result<u128, ClientError> {
        let price = provider.get_gas_price().await?;
        Ok(scale_gas_price(price, self.gas_price_multiplier))
    }

    /// Send a share of the wallet's balance back to itself
    #[instrument(skip_all, fields(address = %signer.address()))]
    pub async fn transfer_to_self(
        &self,
        signer: &PrivateKeySigner,
    ) -> Result<TransactionReceipt, ClientError> {
        let provider = self.wallet_provider(signer);
        let address = signer.address();

        let balance = provider.get_balance(address).await?;
        let gas_price = self.gas_price(&provider).await?;
        let amount = transfer_amount(balance, self.transfer_percentage, gas_price)
            .ok_or(ClientError::InsufficientBalance(balance))?;
        info!(
            "Transferring {} of {} ETH to self",
            format_ether(amount),
            format_ether(balance)
        );

        let tx = TransactionRequest::default()
            .with_to(address)
            .with_value(amount)
            .with_gas_price(gas_price)
            .with_gas_limit(TRANSFER_GAS);
        let receipt = provider.send_transaction(tx).await?.get_receipt().await?;
        ensure_success(&receipt)?;

        info!("Transfer confirmed: {}", receipt.transaction_hash);
        Ok(receipt)
    }

    /// Deploy the creation bytecode of a compiled artifact
    pub async fn deploy(
        &self,
        provider: &impl Provider,
        artifact: &Path,
    ) -> Result<Address, ClientError> {
        let bytecode = load_bytecode(artifact)?;
        let gas_price = self.gas_price(provider).await?;

        let tx = TransactionRequest::default()
            .with_deploy_code(bytecode)
            .with_gas_price(gas_price);
        let receipt = provider.send_transaction(tx).await?.get_receipt().await?;
        ensure_success(&receipt)?;

        let address = receipt
            .contract_address
            .ok_or(ClientError::NoContractAddress(receipt.transaction_hash))?;
        info!("Deployed {} at {address}", artifact.display());
        Ok(address)
    }

    #[instrument(skip_all, fields(address = %signer.address()))]
    pub async fn run_contract_flow(
        &self,
        signer: &PrivateKeySigner,
        config: &ContractConfig,
    ) -> Result<Address, ClientError> {
        let provider = self.wallet_provider(signer);
        self.deploy(&provider, &config.artifact).await
    }

    /// Deploy a token, mint to the wallet and burn part of it
    #[instrument(skip_all, fields(address = %signer.address()))]
    pub async fn run_erc20_flow(
        &self,
        signer: &PrivateKeySigner,
        config: &Erc20Config,
    ) -> Result<Address, ClientError> {
        let provider = self.wallet_provider(signer);
        let owner = signer.address();

        let token_address = self.deploy(&provider, &config.artifact).await?;
        let token = IMintableToken::new(token_address, &provider);
        let decimals = token.decimals().call().await?;
        let unit = U256::from(10u64).pow(U256::from(decimals));

        let gas_price = self.gas_price(&provider).await?;
        let mint = token
            .mint(owner, U256::from(config.mint_amount) * unit)
            .gas_price(gas_price)
            .send()
            .await?
            .get_receipt()
            .await?;
        ensure_success(&mint)?;
        info!("Minted {} tokens: {}", config.mint_amount, mint.transaction_hash);

        if config.burn_amount > 0 {
            let burn = token
                .burn(U256::from(config.burn_amount) * unit)
                .gas_price(gas_price)
                .send()
                .await?
                .get_receipt()
                .await?;
            ensure_success(&burn)?;
            info!("Burned {} tokens: {}", config.burn_amount, burn.transaction_hash);
        }

        let balance = token.balanceOf(owner).call().await?;
        info!("Token balance: {}", balance / unit);
        Ok(token_address)
    }

    /// Deploy a collection and mint to the wallet
    #[instrument(skip_all, fields(address = %signer.address()))]
    pub async fn run_nft_flow(
        &self,
        signer: &PrivateKeySigner,
        config: &NftConfig,
    ) -> Result<Address, ClientError> {
        let provider = self.wallet_provider(signer);
        let owner = signer.address();

        let collection_address = self.deploy(&provider, &config.artifact).await?;
        let collection = IMintableNft::new(collection_address, &provider);

        let gas_price = self.gas_price(&provider).await?;
        for n in 1..=config.mint_count {
            let mint = collection
                .mint(owner)
                .gas_price(gas_price)
                .send()
                .await?
                .get_receipt()
                .await?;
            ensure_success(&mint)?;
            info!("Minted NFT {n}/{}: {}", config.mint_count, mint.transaction_hash);
        }

        let balance = collection.balanceOf(owner).call().await?;
        info!("NFT balance: {balance}");
        Ok(collection_address)
    }
}

fn ensure_success(receipt: &TransactionReceipt) -> Result<(), ClientError> {
    if receipt.status() {
        Ok(())
    } else {
        Err(ClientError::Reverted(receipt.transaction_hash))
    }
}

/// Gas price scaled by a multiplier, rounded up
pub fn scale_gas_price(price: u128, multiplier: f64) -> u128 {
    (price as f64 * multiplier.max(0.0)).ceil() as u128
}

/// `percentage` of the balance, capped so the transfer plus its gas fits the
/// balance. None when nothing can be sent.
pub fn transfer_amount(balance: U256, percentage: f64, gas_price: u128) -> Option<U256> {
    let basis_points = (percentage.clamp(0.0, 100.0) * 100.0).round() as u64;
    let fee = U256::from(gas_price) * U256::from(TRANSFER_GAS);
    let spendable = balance.saturating_sub(fee);
    let amount = (balance * U256::from(basis_points) / U256::from(10_000u64)).min(spendable);
    (!amount.is_zero()).then_some(amount)
}
