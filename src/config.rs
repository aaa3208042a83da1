use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Error, Result};
use crate::scan::ErrorPolicy;

pub const CONFIG_FILE: &str = "dupscan.yaml";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
    pub require_extension: bool,
    pub verify: bool,
    pub min_size: Option<u64>,
    pub on_error: Option<ErrorPolicy>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Config {
    /// Load config from an explicit path, or from dupscan.yaml in the CWD
    /// then next to the executable. No file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in &config_candidates() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let parse = || -> std::result::Result<Config, ConfigError> {
            let text = std::fs::read_to_string(path)?;
            if text.trim().is_empty() {
                return Ok(Config::default());
            }
            Ok(serde_yaml::from_str(&text)?)
        };
        let config = parse().map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(CONFIG_FILE));
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "skip_hidden: true\non_error: skip\ninclude:\n  - \"*.jpg\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(config.skip_hidden);
        assert!(!config.verify);
        assert_eq!(config.on_error, Some(ErrorPolicy::Skip));
        assert_eq!(config.include, vec!["*.jpg".to_string()]);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(!config.skip_hidden);
        assert_eq!(config.min_size, None);
    }

    #[test]
    fn invalid_yaml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "skip_hidden: [not a bool\n").unwrap();

        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(Config::load(Some(path.as_path())).is_err());
    }
}
