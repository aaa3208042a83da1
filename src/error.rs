use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A directory could not be listed (or a link resolved) while walking a root.
    #[error("cannot walk {}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot stat {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be opened or read while hashing or verifying it.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// The filesystem path the error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Walk { path, .. }
            | Error::Metadata { path, .. }
            | Error::Read { path, .. }
            | Error::Config { path, .. } => Some(path),
            Error::Pattern { .. } => None,
        }
    }
}
