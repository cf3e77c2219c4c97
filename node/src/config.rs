//! Operator configuration
//!
//! Layering: optional TOML file, then `BAZAAR_*` environment variables
//! (`__` separates nested keys, e.g. `BAZAAR_STORAGE__BACKEND=memory`).

use anyhow::{bail, Context, Result};
use bazaar_types::{Investor, LedgerSnapshot, SystemSettings, TreasuryState, DEFAULT_TOTAL_SHARES};
use config::{Config, Environment, File as ConfigFile};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "bazaar.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_total_shares")]
    pub total_shares: u64,

    // Fee settings used when storage is empty
    #[serde(default = "default_platform_fee")]
    pub platform_fee_percentage: Decimal,
    #[serde(default = "default_investor_dividend")]
    pub investor_dividend_percentage: Decimal,
    #[serde(default)]
    pub terms_and_conditions: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Seed investors, used only when storage is empty
    #[serde(default)]
    pub investors: Vec<Investor>,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sled
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/treasury")
}

fn default_total_shares() -> u64 {
    DEFAULT_TOTAL_SHARES
}

fn default_platform_fee() -> Decimal {
    SystemSettings::default().platform_fee_percentage
}

fn default_investor_dividend() -> Decimal {
    SystemSettings::default().investor_dividend_percentage
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl AppConfig {
    /// Load configuration. An explicit path must exist; otherwise
    /// `bazaar.toml` in the working directory is used when present.
    pub fn load(config_path_override: Option<&Path>) -> Result<Self> {
        let resolved_path = match config_path_override {
            Some(path) => {
                if !path.exists() {
                    bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path.to_path_buf())
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                path.exists().then_some(path)
            }
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(
            Environment::with_prefix("BAZAAR")
                .prefix_separator("_")
                .separator("__"),
        );

        let config: AppConfig = builder
            .build()?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> SystemSettings {
        SystemSettings {
            platform_fee_percentage: self.platform_fee_percentage,
            investor_dividend_percentage: self.investor_dividend_percentage,
            terms_and_conditions: self.terms_and_conditions.clone(),
        }
    }

    /// State used to seed an empty repository.
    pub fn seed_state(&self) -> TreasuryState {
        TreasuryState {
            settings: self.settings(),
            ledger: LedgerSnapshot::new(self.total_shares, self.investors.clone()),
        }
    }

    fn validate(&self) -> Result<()> {
        self.settings().validate()?;
        if self.total_shares == 0 {
            bail!("total_shares must be greater than zero");
        }
        if !matches!(self.log_format.as_str(), "pretty" | "compact") {
            bail!(
                "log_format must be \"pretty\" or \"compact\", got {:?}",
                self.log_format
            );
        }
        Ok(())
    }
}
