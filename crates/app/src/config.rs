use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use soundy_core::DOCUMENT_FILE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the board document lives. Unset means the platform data dir.
    pub store_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("soundy").join("config.toml"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Missing or malformed files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::warn!(path = %path.display(), "could not write config: {e:#}");
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("soundy").join(DOCUMENT_FILE)))
            .unwrap_or_else(|| PathBuf::from(DOCUMENT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "store_path = [").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "store_path = \"/tmp/my-boards.json\"\n").unwrap();

        let config = Config::load_from(&path);

        assert_eq!(config.store_path(), PathBuf::from("/tmp/my-boards.json"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("soundy").join("config.toml");
        let config = Config {
            store_path: Some(PathBuf::from("/srv/boards.json")),
            log_level: "debug".to_string(),
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_default_store_path_is_document_file() {
        let config = Config::default();
        assert_eq!(
            config.store_path().file_name().and_then(|n| n.to_str()),
            Some(DOCUMENT_FILE)
        );
    }
}
