//! Locates a contract's storage layout in compiler output.
//!
//! Supported shapes:
//! - hardhat build-info: `output.contracts[source][name].storageLayout`
//! - solc standard JSON output: `contracts[source][name].storageLayout`
//! - solc `--combined-json storage-layout`: `contracts["source:name"]["storage-layout"]`
//! - a bare `storageLayout` object

use super::{
    LayoutError,
    StorageLayout,
};

use serde_json::Value;
use std::path::Path;
use tracing::{
    debug,
    warn,
};

/// Reads compiler output from `path` and extracts the layout of `contract`.
pub fn load_storage_layout(
    path: impl AsRef<Path>,
    contract: &str,
) -> Result<StorageLayout, LayoutError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let output: Value = serde_json::from_str(&content)?;
    find_storage_layout(&output, contract)
}

/// Extracts the layout of `contract` (either `Name` or `source:Name`) from compiler output.
pub fn find_storage_layout(output: &Value, contract: &str) -> Result<StorageLayout, LayoutError> {
    if output.get("storage").is_some_and(Value::is_array) {
        debug!("Compiler output is a bare storage layout");
        return Ok(serde_json::from_value(output.clone())?);
    }

    let (source, name) = match contract.rsplit_once(':') {
        Some((source, name)) => (Some(source), name),
        None => (None, contract),
    };

    let contracts = output
        .pointer("/output/contracts")
        .or_else(|| output.get("contracts"))
        .and_then(Value::as_object)
        .ok_or_else(|| LayoutError::ContractNotFound(contract.to_string()))?;

    let mut candidates = Vec::new();
    for (key, entry) in contracts {
        match key.rsplit_once(':') {
            // Combined JSON, keyed by `source:name`.
            Some((entry_source, entry_name)) => {
                if entry_name == name && source.map_or(true, |s| s == entry_source) {
                    candidates.push((key.as_str(), entry.get("storage-layout")));
                }
            }
            // Standard JSON, keyed by source then contract name.
            None => {
                if source.is_some_and(|s| s != key.as_str()) {
                    continue;
                }
                if let Some(entry) = entry.get(name) {
                    candidates.push((key.as_str(), entry.get("storageLayout")));
                }
            }
        }
    }

    let Some((found_in, layout)) = candidates.first().copied() else {
        return Err(LayoutError::ContractNotFound(contract.to_string()));
    };
    if candidates.len() > 1 {
        warn!(
            contract,
            found_in, "Contract name is ambiguous, using the first match"
        );
    }

    match layout {
        // Older solc versions emit the combined-json layout as an encoded string.
        Some(Value::String(encoded)) => StorageLayout::from_json_str(encoded),
        Some(layout) if !layout.is_null() => Ok(serde_json::from_value(layout.clone())?),
        _ => Err(LayoutError::MissingStorageLayout(contract.to_string())),
    }
}
