use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::Result;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use crate::{commands::Command, config::Config};

mod commands;
mod config;
mod runner;
mod wallets;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, env("DRIP_CONFIG"))]
    config: Option<PathBuf>,
    /// Scrappey api key for solving captchas
    #[arg(long, env("SCRAPPEY_API_KEY"), hide_env_values = true)]
    api_key: Option<String>,
    /// HTTP RPC URL for sending transactions
    #[arg(long, env("HTTP_RPC"))]
    http_rpc: Option<Url>,
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Apply argument overrides to configuration
    fn override_config(&self, config: &mut Config) {
        if let Some(key) = self.api_key.clone() {
            config.faucet.api_key = key;
        }
        if let Some(rpc) = self.http_rpc.clone() {
            config.eth.rpc = rpc;
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = Config::load(args.config.as_ref())?;
    args.override_config(&mut config);

    args.command.execute(config)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(ErrorLayer::default())
        .try_init();
}
