//! Configuration loading and table resolution
//!
//! A [`CoreConfig`] is read once at startup and says where the code root and
//! the external tables live. [`Tables::load`] then builds the controlled
//! vocabulary and the variable translator from it; callers pass those by
//! reference rather than reaching for global state.

use crate::cmip6::ControlledVocabulary;
use crate::translator::VariableTranslator;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable consulted for the code root
pub const CODE_ROOT_ENV: &str = "MDTF_CODE_ROOT";

/// Logging section of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` level directive (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Resolved configuration for the core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Root of the code checkout holding `src/` tables
    pub code_root: Option<PathBuf>,
    /// Explicit CV table; defaults to the CMOR tables under the code root
    pub cv_table: Option<PathBuf>,
    /// Directory holding `fieldlist_*.jsonc`; defaults to `<code_root>/src`
    pub fieldlist_dir: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Couldn't read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Load `path`, or the default config file, or fall back to defaults.
    ///
    /// A missing default file is not an error; an explicit `path` that cannot
    /// be read is.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                warn!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Code root in priority order:
    /// 1. Explicit argument
    /// 2. `MDTF_CODE_ROOT` environment variable
    /// 3. `code_root` from the config file
    /// 4. Current directory
    pub fn resolve_code_root(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CODE_ROOT_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.code_root {
            return path.clone();
        }
        PathBuf::from(".")
    }

    pub fn cv_table_path(&self, code_root: &Path) -> PathBuf {
        self.cv_table.clone().unwrap_or_else(|| {
            code_root
                .join("src")
                .join("cmip6-cmor-tables")
                .join("Tables")
                .join("CMIP6_CV.json")
        })
    }

    pub fn fieldlist_dir(&self, code_root: &Path) -> PathBuf {
        self.fieldlist_dir
            .clone()
            .unwrap_or_else(|| code_root.join("src"))
    }
}

/// Default config file: `<config dir>/mdtf/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mdtf").join("config.toml"))
}

/// Tables loaded once at startup
#[derive(Debug)]
pub struct Tables {
    pub vocabulary: ControlledVocabulary,
    pub translator: VariableTranslator,
}

impl Tables {
    pub fn load(config: &CoreConfig, code_root: &Path) -> Result<Self> {
        let cv_path = config.cv_table_path(code_root);
        let fieldlist_dir = config.fieldlist_dir(code_root);
        info!("Loading tables (CV: {}, field lists: {})", cv_path.display(), fieldlist_dir.display());

        Ok(Self {
            vocabulary: ControlledVocabulary::load(&cv_path)?,
            translator: VariableTranslator::load_dir(&fieldlist_dir)?,
        })
    }
}
