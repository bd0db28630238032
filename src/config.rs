use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;
use storage_codec::primitives::Address;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CodecConfig {
    /// Compiler output holding the storage layout: a hardhat build-info file, solc
    /// standard JSON or combined JSON output, or a bare `storageLayout` object.
    #[arg(long)]
    pub artifact: PathBuf,
    /// Contract to use, either `Name` or `source:Name`. Ignored for bare layouts.
    #[arg(long, default_value = "")]
    pub contract: String,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Prints the packed storage slots for a JSON object of variable values.
    Slots {
        /// JSON object mapping variable names to values, or `@file` to read it from a file.
        #[arg(long)]
        values: String,
    },
    /// Decodes a variable from a JSON storage dump of `slot -> value` pairs.
    Read {
        /// JSON object mapping slots to values, both as hex or decimal strings.
        #[arg(long)]
        dump: PathBuf,
        /// Address the dump belongs to.
        #[arg(long, default_value_t = Address::ZERO)]
        address: Address,
        /// Name of the variable to decode.
        #[arg(long)]
        variable: String,
        /// Mapping keys, outermost first. Repeat for nested mappings.
        #[arg(long = "key")]
        keys: Vec<String>,
    },
}
