//! `lcd-query`: command line access to a CosmWasm LCD backend.
//!
//! Every subcommand maps to one `ChainQueryClient` operation and prints the result
//! as pretty JSON on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use cosmwasm_lcd_client::config::validation::validate_config;
use cosmwasm_lcd_client::config::{load_config, ClientConfig, ConfigError};
use cosmwasm_lcd_client::lcd::types::{BroadcastMode, StdTx, WrappedStdTx};
use cosmwasm_lcd_client::lcd::{ChainQueryClient, SearchTag, SearchTxFilter, SearchTxQuery};
use cosmwasm_lcd_client::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "lcd-query")]
#[command(about = "Query a CosmWasm LCD backend", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LCD API URL, overrides the configuration file.
    #[arg(short, long)]
    url: Option<String>,

    /// Broadcast mode (block, sync, async), overrides the configuration file.
    #[arg(long)]
    broadcast_mode: Option<BroadcastMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chain id
    ChainId,
    /// Print the current height
    Height,
    /// Show an account
    Account { address: String },
    /// Show account number and sequence
    Sequence { address: String },
    /// Show a block (latest when no height is given)
    Block { height: Option<u64> },
    /// Show a transaction by hash
    Tx { hash: String },
    /// Search transactions
    Search {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        height: Option<u64>,
        #[arg(long)]
        sent_from_or_to: Option<String>,
        /// KEY=VALUE, repeatable
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<SearchTag>,
        #[arg(long)]
        min_height: Option<u64>,
        #[arg(long)]
        max_height: Option<u64>,
    },
    /// List uploaded codes
    Codes,
    /// Show code metadata (bytecode as base64)
    Code { code_id: u64 },
    /// List contracts instantiated from a code
    Contracts { code_id: u64 },
    /// Show a contract
    Contract { address: String },
    /// Show a contract's code history
    History { address: String },
    /// Dump a contract's storage
    State { address: String },
    /// Read a raw storage key (hex in, hex out)
    Raw { address: String, key: String },
    /// Run a smart query (JSON message)
    Smart { address: String, query: String },
    /// Print the identifier of a signed transaction (JSON file)
    Identifier { file: PathBuf },
    /// Broadcast a signed transaction (JSON file)
    Broadcast { file: PathBuf },
}

fn parse_tag(s: &str) -> Result<SearchTag, String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(SearchTag::new(key, value)),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn search_query(
    id: Option<String>,
    height: Option<u64>,
    sent_from_or_to: Option<String>,
    tags: Vec<SearchTag>,
) -> Result<SearchTxQuery, String> {
    let mut queries = Vec::new();
    if let Some(id) = id {
        queries.push(SearchTxQuery::Id(id));
    }
    if let Some(height) = height {
        queries.push(SearchTxQuery::Height(height));
    }
    if let Some(address) = sent_from_or_to {
        queries.push(SearchTxQuery::SentFromOrTo(address));
    }
    if !tags.is_empty() {
        queries.push(SearchTxQuery::Tags(tags));
    }

    match queries.len() {
        1 => Ok(queries.remove(0)),
        0 => Err("one of --id, --height, --sent-from-or-to or --tag is required".to_string()),
        _ => Err("--id, --height, --sent-from-or-to and --tag are mutually exclusive".to_string()),
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.lcd.api_url = url.clone();
    }
    if let Some(mode) = cli.broadcast_mode {
        config.lcd.broadcast_mode = mode;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_tx(path: &Path) -> Result<StdTx, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    // accept both the bare and the amino-wrapped form
    if let Ok(wrapped) = serde_json::from_str::<WrappedStdTx>(&content) {
        return Ok(wrapped.value);
    }
    Ok(serde_json::from_str::<StdTx>(&content)?)
}

/// Storage values are arbitrary bytes, so print them as hex.
fn raw_value_hex(value: Option<Vec<u8>>) -> Option<String> {
    value.map(hex::encode)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(&config.observability);

    tracing::debug!(
        api_url = %config.lcd.api_url,
        broadcast_mode = ?config.lcd.broadcast_mode,
        "Configuration loaded"
    );

    let client = ChainQueryClient::from_config(&config.lcd)?;

    match cli.command {
        Commands::ChainId => print_json(&client.get_chain_id().await?)?,
        Commands::Height => print_json(&client.get_height().await?)?,
        Commands::Account { address } => print_json(&client.get_account(&address).await?)?,
        Commands::Sequence { address } => print_json(&client.get_sequence(&address).await?)?,
        Commands::Block { height } => print_json(&client.get_block(height).await?)?,
        Commands::Tx { hash } => print_json(&client.get_tx(&hash).await?)?,
        Commands::Search {
            id,
            height,
            sent_from_or_to,
            tags,
            min_height,
            max_height,
        } => {
            let query = search_query(id, height, sent_from_or_to, tags)?;
            let filter = SearchTxFilter::new(min_height, max_height);
            print_json(&client.search_tx(&query, filter).await?)?
        }
        Commands::Codes => print_json(&client.get_codes().await?)?,
        Commands::Code { code_id } => print_json(&client.get_code_details(code_id).await?)?,
        Commands::Contracts { code_id } => print_json(&client.get_contracts(code_id).await?)?,
        Commands::Contract { address } => print_json(&client.get_contract(&address).await?)?,
        Commands::History { address } => {
            print_json(&client.get_contract_code_history(&address).await?)?
        }
        Commands::State { address } => print_json(&client.get_all_contract_state(&address).await?)?,
        Commands::Raw { address, key } => {
            let key = hex::decode(&key)?;
            let value = client.query_contract_raw(&address, &key).await?;
            print_json(&raw_value_hex(value))?
        }
        Commands::Smart { address, query } => {
            let msg: serde_json::Value = serde_json::from_str(&query)?;
            let response: serde_json::Value = client.query_contract_smart(&address, &msg).await?;
            print_json(&response)?
        }
        Commands::Identifier { file } => {
            let tx = WrappedStdTx::new(read_tx(&file)?);
            print_json(&client.get_identifier(&tx).await?)?
        }
        Commands::Broadcast { file } => {
            let tx = read_tx(&file)?;
            print_json(&client.broadcast_tx(&tx).await?)?
        }
    }

    Ok(())
}
