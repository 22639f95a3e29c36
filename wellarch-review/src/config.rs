//! Engine configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty or missing
//! file yields a working configuration:
//!
//! ```toml
//! lens_alias = "wellarchitected"
//! page_size = 50
//!
//! [retry]
//! max_retries = 3
//! base_delay = "1s"
//! max_backoff = "30s"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "WELLARCH_CONFIG";

/// Default lens the review runs against.
pub const DEFAULT_LENS_ALIAS: &str = "wellarchitected";

/// Default root of the best-practice documentation.
pub const DEFAULT_DOCS_BASE_URL: &str = "https://docs.aws.amazon.com/wellarchitected/latest/";

/// Configuration for [`ReviewEngine`](crate::ReviewEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Retry limits for remote calls.
    pub retry: RetryConfig,
    /// Lens whose questions are reviewed.
    pub lens_alias: String,
    /// Answers requested per page.
    pub page_size: u32,
    /// Root URL for best-practice references in improvement plans.
    pub docs_base_url: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            lens_alias: DEFAULT_LENS_ALIAS.to_string(),
            page_size: 50,
            docs_base_url: DEFAULT_DOCS_BASE_URL.to_string(),
        }
    }
}

impl ReviewConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$WELLARCH_CONFIG`, else the user config file, else defaults.
    pub fn load_default() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Config file that `load_default` would read, if one applies.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let user_path = wellarch_paths::config_dir().join("config.toml");
        user_path.exists().then_some(user_path)
    }

    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        if self.page_size == 0 {
            return Err(Error::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.lens_alias.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "lens_alias must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the retry limits.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the page size for answer listings.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}
