//! CLI subcommands.

pub mod expense;
pub mod mappings;
pub mod parse;

use std::path::PathBuf;

use kassa_core::KassaConfig;

/// Load configuration from the given path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KassaConfig> {
    match config_path {
        Some(path) => Ok(KassaConfig::from_file(std::path::Path::new(path))?),
        None => Ok(KassaConfig::default()),
    }
}

/// Default database location: `<data dir>/kassa/finance.db`.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kassa")
        .join("finance.db")
}
