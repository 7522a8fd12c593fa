//! Configuration for the match engine
//!
//! Score weights are deliberately fixed constants in `matching::score`;
//! configuration covers only the operational knobs (cache TTL, default
//! match/join limits) and the local data directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Operational configuration for the match engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// How long a ranked result list stays fresh, in minutes
    pub cache_ttl_minutes: u32,
    /// Default number of pods to recommend per request
    pub match_limit: usize,
    /// Default cap on auto-join attempts per request
    pub join_limit: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 5,
            match_limit: 5,
            join_limit: 2,
        }
    }
}

/// Load configuration from a TOML file, falling back to defaults
/// when the file does not exist
pub fn load_config(config_path: &Path) -> Result<MatchConfig> {
    if !config_path.exists() {
        return Ok(MatchConfig::default());
    }

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config at {:?}", config_path))?;
    let config: MatchConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config at {:?}", config_path))?;
    Ok(config)
}

/// Save configuration to a TOML file
pub fn save_config(config: &MatchConfig, config_path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config at {:?}", config_path))?;
    Ok(())
}

/// Resolve the podmatch data directory (~/.podmatch), honoring the
/// PODMATCH_DIR override for tests and sandboxed installs
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PODMATCH_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".podmatch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.cache_ttl_minutes, 5);
        assert_eq!(config.match_limit, 5);
        assert_eq!(config.join_limit, 2);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config.cache_ttl_minutes, 5);
    }

    #[test]
    fn test_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let config = MatchConfig {
            cache_ttl_minutes: 10,
            match_limit: 8,
            join_limit: 3,
        };
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.cache_ttl_minutes, 10);
        assert_eq!(loaded.match_limit, 8);
        assert_eq!(loaded.join_limit, 3);
    }
}
