use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the pool git layer
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PoolError {
    /// Exit status of the failed git command, if this error carries one.
    #[must_use]
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Self::Git(e) => e.status(),
            _ => None,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error while accessing config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration format - please check your config.toml syntax: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    #[error("Could not determine home directory - please set HOME environment variable")]
    HomeDirNotFound,
}

/// Git-related errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository `{}'", .path.display())]
    NotARepository { path: PathBuf },

    #[error("Git command failed (exit status {status}): {command}{}", output_suffix(.output))]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    #[error("Could not run `{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid git output format: {output}")]
    InvalidStatus { output: String },

    #[error("Usage error: {0}")]
    Usage(String),
}

impl GitError {
    /// Exit status carried by [`GitError::CommandFailed`].
    #[must_use]
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!("\nOutput: {output}")
    }
}

/// Type alias for Result using `PoolError`
pub type Result<T> = std::result::Result<T, PoolError>;
