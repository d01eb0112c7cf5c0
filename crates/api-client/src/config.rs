use std::path::PathBuf;

use anyhow::{Context, Result};

const CONFIG_DIRNAME: &str = ".azion";
const SETTINGS_FILENAME: &str = "settings.toml";
const METRICS_FILENAME: &str = "metrics.json";

/// Process-wide configuration context
///
/// Built once from command line flags and environment, then handed to every
/// operation needing the identity endpoint or on-disk locations.
#[derive(Debug, Clone, bon::Builder)]
#[builder(on(String, into))]
pub struct Config {
    /// Overrides the default `~/.azion` directory
    dir: Option<PathBuf>,
    #[builder(default = crate::PROD_AUTH_URL.to_string())]
    auth_url: String,
}

impl Config {
    /// Resolves the directory holding persisted CLI state
    pub fn dir(&self) -> Result<PathBuf> {
        let dir = match self.dir {
            Some(ref dir) => dir.clone(),
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not get user home directory"))?
                .join(CONFIG_DIRNAME),
        };

        std::path::absolute(&dir)
            .with_context(|| format!("Could not resolve config dir {}", dir.display()))
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        Ok(self.dir()?.join(SETTINGS_FILENAME))
    }

    pub fn metrics_path(&self) -> Result<PathBuf> {
        Ok(self.dir()?.join(METRICS_FILENAME))
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }
}
