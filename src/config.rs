//! Configuration Management Module
//!
//! Settings that shape how the git layer invokes the external tool:
//! - which `git` program to run
//! - whether `git init` output is discarded
//!
//! # Configuration Structure
//!
//! The configuration is stored in TOML format at `~/.config/pool/config.toml`:
//!
//! ```toml
//! git = "/usr/bin/git"
//! quiet_init = true
//! ```
//!
//! A missing file yields the defaults. The `POOL_GIT` environment variable
//! overrides the program when set.

use std::{env, fs, path::PathBuf};

use serde::Deserialize;

use crate::errors::{ConfigError, Result};

pub const CONFIG_FOLDER_NAME: &str = "pool";

/// Environment variable overriding [`GitSettings::git`].
pub const GIT_PROGRAM_ENV: &str = "POOL_GIT";

/// How the external git tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Program run for every git invocation.
    pub git: String,

    /// Discard the stdout of `git init` unless the caller asks for verbose output.
    pub quiet_init: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            quiet_init: true,
        }
    }
}

impl GitSettings {
    /// Replaces the program with `program` when it is set and non-empty.
    #[must_use]
    pub fn with_program_override(mut self, program: Option<String>) -> Self {
        if let Some(program) = program.filter(|p| !p.trim().is_empty()) {
            self.git = program;
        }
        self
    }
}

/// Locates and reads the configuration file
pub struct Config {
    root: PathBuf,
}

impl Config {
    /// Creates a new Config rooted at the user's home directory
    ///
    /// # Errors
    /// * When the home directory cannot be determined
    pub fn new() -> Result<Self> {
        let root = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(Config { root })
    }

    /// Creates a new Config instance with a custom root path
    ///
    /// # Arguments
    /// * `root` - The custom root path
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Config { root: root.into() }
    }

    /// Reads the settings, falling back to defaults when no file exists,
    /// then applies the `POOL_GIT` override.
    ///
    /// # Errors
    /// * If the configuration file exists but cannot be read
    /// * If the configuration file is not valid TOML for [`GitSettings`]
    pub fn load(&self) -> Result<GitSettings> {
        let settings = self.read_file()?;
        Ok(settings.with_program_override(env::var(GIT_PROGRAM_ENV).ok()))
    }

    fn read_file(&self) -> Result<GitSettings> {
        let config_file = self.get_config_file_path();

        if !config_file.exists() {
            return Ok(GitSettings::default());
        }

        let content = fs::read_to_string(&config_file).map_err(ConfigError::from)?;
        let settings = toml::from_str(&content).map_err(ConfigError::from)?;

        Ok(settings)
    }

    /// Returns the path to the configuration folder.
    #[must_use]
    pub fn get_config_folder_path(&self) -> PathBuf {
        self.root.join(".config").join(CONFIG_FOLDER_NAME)
    }

    /// Returns the path to the configuration file
    #[must_use]
    pub fn get_config_file_path(&self) -> PathBuf {
        self.get_config_folder_path().join("config.toml")
    }
}
