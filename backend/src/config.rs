use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

/// Which `Store` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown store backend {other:?} (expected \"file\" or \"memory\")"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub inventory_file: PathBuf,
    pub store_backend: StoreBackend,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            inventory_file: var("INVENTORY_FILE")
                .unwrap_or_else(|| "inventory.json".to_string())
                .into(),
            store_backend: var("STORE_BACKEND")
                .unwrap_or_else(|| "file".to_string())
                .parse()
                .context("STORE_BACKEND must be \"file\" or \"memory\"")?,
        })
    }
}
