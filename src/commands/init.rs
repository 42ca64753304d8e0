//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write a default config file at `config_path`
pub fn cmd_init(config_path: &Path, force: bool) -> Result<PathBuf> {
    if config_path.exists() && !force {
        return Err(Error::AlreadyInitialized(format!(
            "{} (use --force to overwrite)",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths.config_file = config_path.to_path_buf();
    config.save()?;

    info!("Wrote default configuration to {}", config_path.display());
    Ok(config_path.to_path_buf())
}
