use crate::args::Defaults;
use crate::error::{BulkError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// Repository file used when nothing else names one.
pub const DEFAULT_REPOSITORY_FILENAME: &str = "repository.json";

/// Environment variable naming the repository file.
pub const REPOSITORY_ENV: &str = "DSBULK_REPO";

/// User configuration, stored as `config.json` in the config directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkConfig {
    /// Repository JSON file to open when `--repo` and `DSBULK_REPO` are absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<PathBuf>,

    /// Output format used when `--format` is absent (TXT or TSV)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Comma-separated columns used when `--include` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

impl BulkConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(BulkError::Io)?;
        let config: BulkConfig =
            serde_json::from_str(&content).map_err(BulkError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(BulkError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(BulkError::Serialization)?;
        fs::write(config_path, content).map_err(BulkError::Io)?;
        Ok(())
    }

    /// Fallbacks for options missing on the command line.
    pub fn defaults(&self) -> Defaults {
        Defaults {
            format: self.format.clone(),
            include: self.include.clone(),
        }
    }

    /// Which repository file to open.
    ///
    /// Precedence: `--repo`, then the `DSBULK_REPO` value, then this
    /// config, then `repository.json` in the data directory.
    pub fn repository_path(
        &self,
        cli_repo: Option<&Path>,
        env_repo: Option<PathBuf>,
        data_dir: &Path,
    ) -> PathBuf {
        if let Some(path) = cli_repo {
            return path.to_path_buf();
        }
        env_repo
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| self.repository.clone())
            .unwrap_or_else(|| data_dir.join(DEFAULT_REPOSITORY_FILENAME))
    }
}
