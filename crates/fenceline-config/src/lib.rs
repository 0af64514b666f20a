use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {config_path}: {source}")]
    Write {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {source}")]
    Serialize { source: toml::ser::Error },

    #[error("Documents directory not found: {docs_path}")]
    DocsDirNotFound { docs_path: PathBuf },

    #[error("Invalid document glob pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub docs_path: PathBuf,
    /// Language applied to fenced blocks with no language tag.
    pub default_language: Option<String>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded docs path
        config.docs_path = Self::expand_path(&config.docs_path).unwrap_or(config.docs_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::default_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> Result<(), ConfigError> {
        let config_path = config_path.as_ref();
        let write_error = |source| ConfigError::Write {
            config_path: config_path.to_path_buf(),
            source,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })?;
        std::fs::write(config_path, content).map_err(write_error)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::default_config_path();
        self.save_to_path(&config_path)
    }

    pub fn default_config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/fenceline");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// All Markdown documents under `docs_path`, recursively, sorted by path.
    pub fn discover_documents(&self) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.docs_path.is_dir() {
            return Err(ConfigError::DocsDirNotFound {
                docs_path: self.docs_path.clone(),
            });
        }

        let pattern = self.docs_path.join("**/*.md").to_string_lossy().into_owned();
        let paths = glob::glob(&pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        // unreadable entries are skipped rather than failing the whole scan
        let mut documents: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
        documents.sort();
        Ok(documents)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
