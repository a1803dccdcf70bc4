//! Daemon configuration: CLI flags layered over an optional JSON file

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pathcache::{CacheConfig, DuplicatePolicy};
use serde::Deserialize;

const DEFAULT_BIND: &str = "127.0.0.1:3490";
const DEFAULT_ROOT: &str = "./serverroot";
const DEFAULT_CAPACITY: usize = 10;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Bind address [default: 127.0.0.1:3490]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directory to serve [default: ./serverroot]
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Cache capacity (number of resources) [default: 10]
    #[arg(short, long)]
    pub capacity: Option<usize>,

    /// Initial key index size, 0 for the built-in default
    #[arg(long)]
    pub index_size: Option<usize>,

    /// Replace cached entries on duplicate puts instead of orphaning them
    #[arg(long)]
    pub replace_duplicates: bool,

    /// JSON config file; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Health check mode (for Docker)
    #[arg(long)]
    pub health: bool,
}

/// Settings accepted in the JSON config file
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Bind address
    pub bind: Option<String>,
    /// Directory to serve
    pub root: Option<PathBuf>,
    /// Cache capacity
    pub capacity: Option<usize>,
    /// Initial key index size
    pub index_size: Option<usize>,
    /// Replace instead of orphaning on duplicate puts
    pub replace_duplicates: Option<bool>,
}

impl FileConfig {
    /// Read and parse a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Fully resolved server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,
    /// Directory to serve
    pub root: PathBuf,
    /// Engine parameters
    pub cache: CacheConfig,
}

impl ServerConfig {
    /// Merge flags, config file, and defaults (in that order of precedence)
    pub fn resolve(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let replace = args.replace_duplicates || file.replace_duplicates.unwrap_or(false);
        let capacity = args.capacity.or(file.capacity).unwrap_or(DEFAULT_CAPACITY);
        if capacity == 0 {
            anyhow::bail!("Invalid cache capacity: 0 (must be at least 1)");
        }

        Ok(Self {
            bind: args
                .bind
                .clone()
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            root: args
                .root
                .clone()
                .or(file.root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
            cache: CacheConfig {
                capacity,
                index_size_hint: args.index_size.or(file.index_size).unwrap_or(0),
                duplicate_policy: if replace {
                    DuplicatePolicy::Replace
                } else {
                    DuplicatePolicy::Orphan
                },
            },
        })
    }
}
