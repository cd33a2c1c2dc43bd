//! Configuration for forum-ledger

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LedgerError;

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("forum-ledger")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the ledger database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Seed values for the economy row on first open
    #[serde(default)]
    pub economy: EconomyDefaults,
}

fn default_pool_size() -> u32 {
    8
}

/// Seed values used when the singleton economy row is first created.
///
/// Costs are stored as signed deltas: negative values are debits. After the
/// first open, the authoritative values live in the database and change only
/// through the admin update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyDefaults {
    #[serde(default = "default_create_post_cost")]
    pub create_post_cost: i64,

    #[serde(default = "default_create_comment_cost")]
    pub create_comment_cost: i64,

    #[serde(default = "default_like_cost")]
    pub like_cost: i64,

    #[serde(default = "default_registration_bonus")]
    pub registration_bonus: i64,

    #[serde(default = "default_receive_like_tier1")]
    pub receive_like_tier1: i64,

    #[serde(default = "default_receive_like_tier2")]
    pub receive_like_tier2: i64,

    #[serde(default = "default_receive_like_tier3")]
    pub receive_like_tier3: i64,

    /// Minimum points required to redeem a crypto reward
    #[serde(default = "default_crypto_reward_cost")]
    pub crypto_reward_cost: i64,

    /// BNB amount paid per redemption, kept as a decimal string
    #[serde(default = "default_crypto_reward_bnb_amount")]
    pub crypto_reward_bnb_amount: String,
}

fn default_create_post_cost() -> i64 {
    -5
}

fn default_create_comment_cost() -> i64 {
    -2
}

fn default_like_cost() -> i64 {
    -1
}

fn default_registration_bonus() -> i64 {
    100
}

fn default_receive_like_tier1() -> i64 {
    3
}

fn default_receive_like_tier2() -> i64 {
    30
}

fn default_receive_like_tier3() -> i64 {
    350
}

fn default_crypto_reward_cost() -> i64 {
    10_000
}

fn default_crypto_reward_bnb_amount() -> String {
    "0.01".to_string()
}

impl Default for EconomyDefaults {
    fn default() -> Self {
        Self {
            create_post_cost: default_create_post_cost(),
            create_comment_cost: default_create_comment_cost(),
            like_cost: default_like_cost(),
            registration_bonus: default_registration_bonus(),
            receive_like_tier1: default_receive_like_tier1(),
            receive_like_tier2: default_receive_like_tier2(),
            receive_like_tier3: default_receive_like_tier3(),
            crypto_reward_cost: default_crypto_reward_cost(),
            crypto_reward_bnb_amount: default_crypto_reward_bnb_amount(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pool_size: default_pool_size(),
            economy: EconomyDefaults::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| LedgerError::Config(format!("Invalid config: {}", e)))
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Serialize failed: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Path of the SQLite database file inside `data_dir`
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }
}
