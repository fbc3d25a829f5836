//! `strat`: query a STRAT node from the command line.
//!
//! Every node command prints the node's JSON response, pretty-printed, and
//! exits non-zero on any error. `validate`, `to-base` and `from-base` run
//! offline.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use strat_sdk::client::{DEFAULT_LATEST_BLOCKS, DEFAULT_PAGE_LIMIT};
use strat_sdk::{ClientConfig, StratClient};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "strat")]
#[command(about = "Command line client for a STRAT blockchain node", long_about = None)]
struct Cli {
    /// Base URL of the node
    #[arg(long, global = true, env = "STRAT_API_URL", default_value = strat_sdk::config::DEFAULT_API_URL)]
    api_url: String,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "STRAT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "STRAT_TIMEOUT_SECS", default_value_t = strat_sdk::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Chain summary
    Info,
    /// One block, by index (digits) or hash
    Block { id: String },
    /// Most recent blocks
    Blocks {
        #[arg(long, default_value_t = DEFAULT_LATEST_BLOCKS)]
        limit: u32,
    },
    /// Balance of an address
    Balance { address: String },
    /// One transaction by id
    Tx { id: String },
    /// Transactions touching an address
    History {
        address: String,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Mempool statistics
    Mempool,
    /// Node health
    Health,
    /// Check an address's format without contacting the node
    Validate { address: String },
    /// Convert a token amount to base units
    ToBase { amount: f64 },
    /// Convert base units to a token amount
    FromBase { units: u128 },
}

impl Cli {
    fn config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::default()
            .with_api_url(&self.api_url)
            .with_timeout_secs(self.timeout);
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        config.validate().context("invalid client settings")?;
        debug!(?config, "resolved client settings");
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<Value> {
    // settings are only checked once a command needs the node
    let config = cli.config();
    let connect = || config.map(StratClient::new);

    let value = match cli.command {
        Command::Info => connect()?.get_blockchain_info()?,
        Command::Block { id } => connect()?.get_block(&id)?,
        Command::Blocks { limit } => connect()?.get_latest_blocks(limit)?,
        Command::Balance { address } => {
            let balance = connect()?.get_balance(&address)?;
            json!({ "address": address, "balance": balance })
        }
        Command::Tx { id } => connect()?.get_transaction(&id)?,
        Command::History {
            address,
            limit,
            offset,
        } => connect()?.get_transaction_history(&address, limit, offset)?,
        Command::Mempool => connect()?.get_mempool_info()?,
        Command::Health => connect()?.health_check()?,
        Command::Validate { address } => json!({
            "valid": strat_sdk::is_valid_address(&address),
            "address": address,
        }),
        // u128 does not fit in a JSON number
        Command::ToBase { amount } => {
            let units = strat_sdk::checked_to_base_units(amount)
                .ok_or_else(|| anyhow!("{amount} tokens exceed the base-unit range"))?;
            json!(units.to_string())
        }
        Command::FromBase { units } => json!(strat_sdk::from_base_units(units)),
    };
    Ok(value)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let value = run(Cli::parse())?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
