mod config;

use config::{
    CodecConfig,
    Command,
};
use storage_codec::{
    codec::compute_storage_slots,
    db::MemoryStorage,
    layout::provider::load_storage_layout,
    primitives::{
        Address,
        B256,
    },
    store::ContractStorage,
    utils::word::parse_uint,
};

use anyhow::{
    anyhow,
    Context,
    Result,
};
use clap::Parser;
use serde_json::{
    Map,
    Value,
};
use std::{
    path::Path,
    sync::Arc,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let config = CodecConfig::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let layout = load_storage_layout(&config.artifact, &config.contract)
        .with_context(|| format!("loading storage layout from {}", config.artifact.display()))?;
    info!(variables = layout.variables().len(), "Loaded storage layout");

    let output = match config.command {
        Command::Slots { values } => {
            let values = read_json_arg(&values)?;
            let variables = values
                .as_object()
                .ok_or_else(|| anyhow!("--values must be a JSON object"))?;
            let slots = compute_storage_slots(
                &layout,
                variables.iter().map(|(name, value)| (name.as_str(), value)),
            )?;
            serde_json::to_string_pretty(&slots)?
        }
        Command::Read {
            dump,
            address,
            variable,
            keys,
        } => {
            let storage = load_dump(&dump, address)?;
            let storage = ContractStorage::new(Arc::new(layout), storage, address);
            let keys: Vec<Value> = keys.into_iter().map(Value::String).collect();
            let value = storage.get_variable(&variable, &keys).await?;
            serde_json::to_string_pretty(&value)?
        }
    };

    println!("{output}");
    Ok(())
}

/// Parses an inline JSON argument, or the file it names when prefixed with `@`.
fn read_json_arg(arg: &str) -> Result<Value> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&json)?)
}

/// Loads a `slot -> value` JSON object into memory storage for `address`.
fn load_dump(path: &Path, address: Address) -> Result<MemoryStorage> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let dump: Map<String, Value> = serde_json::from_str(&content)?;

    let storage = MemoryStorage::new();
    for (slot, value) in &dump {
        let value = value
            .as_str()
            .ok_or_else(|| anyhow!("value of slot {slot} must be a string"))?;
        let slot = parse_uint(slot).ok_or_else(|| anyhow!("invalid slot {slot}"))?;
        let value = parse_uint(value).ok_or_else(|| anyhow!("invalid value {value}"))?;
        storage.insert(address, B256::from(slot), B256::from(value));
    }
    Ok(storage)
}
