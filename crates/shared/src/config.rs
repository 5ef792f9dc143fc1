//! Application configuration management.
//!
//! Configuration is an explicit value. Components receive it through a
//! [`ConfigHandle`] and the owner of the handle decides when to reload.

use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::money::{STORAGE_SCALE, from_minor_units};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Reconciliation tolerances.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Approval workflow settings.
    #[serde(default)]
    pub approval: ApprovalConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Tolerances used by the bank reconciliation matcher.
///
/// Amounts are expressed in minor currency units so that a configuration of
/// `1` means one cent for a two-decimal currency.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Maximum amount difference between a statement line and a transaction.
    #[serde(default = "default_amount_tolerance_minor")]
    pub amount_tolerance_minor: i64,
    /// Number of decimal places of the ledger currency.
    #[serde(default = "default_minor_unit_scale")]
    pub minor_unit_scale: u32,
    /// Maximum day distance between a statement line and a transaction.
    #[serde(default = "default_date_tolerance_days")]
    pub date_tolerance_days: i64,
    /// Maximum difference between computed and declared closing balances.
    #[serde(default = "default_closing_tolerance_minor")]
    pub closing_tolerance_minor: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            amount_tolerance_minor: default_amount_tolerance_minor(),
            minor_unit_scale: default_minor_unit_scale(),
            date_tolerance_days: default_date_tolerance_days(),
            closing_tolerance_minor: default_closing_tolerance_minor(),
        }
    }
}

fn default_amount_tolerance_minor() -> i64 {
    1
}

fn default_minor_unit_scale() -> u32 {
    2
}

fn default_date_tolerance_days() -> i64 {
    3
}

fn default_closing_tolerance_minor() -> i64 {
    1
}

impl ReconciliationConfig {
    /// Amount tolerance as a ledger amount.
    #[must_use]
    pub fn amount_tolerance(&self) -> Decimal {
        from_minor_units(self.amount_tolerance_minor, self.minor_unit_scale)
    }

    /// Closing balance tolerance as a ledger amount.
    #[must_use]
    pub fn closing_tolerance(&self) -> Decimal {
        from_minor_units(self.closing_tolerance_minor, self.minor_unit_scale)
    }

    /// Rejects values the ledger cannot honor.
    ///
    /// # Errors
    ///
    /// Returns an error if the scale exceeds the stored amount scale or any
    /// tolerance is negative.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.minor_unit_scale > STORAGE_SCALE {
            return Err(config::ConfigError::Message(format!(
                "reconciliation.minor_unit_scale must be at most {STORAGE_SCALE}, got {}",
                self.minor_unit_scale
            )));
        }
        for (key, value) in [
            ("amount_tolerance_minor", self.amount_tolerance_minor),
            ("date_tolerance_days", self.date_tolerance_days),
            ("closing_tolerance_minor", self.closing_tolerance_minor),
        ] {
            if value < 0 {
                return Err(config::ConfigError::Message(format!(
                    "reconciliation.{key} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// When an entry gated by several approval requests gets posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingPolicy {
    /// Post as soon as any one request is approved.
    #[default]
    FirstApproval,
    /// Post only once no request on the entry is still pending.
    AllApprovals,
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalConfig {
    /// Posting policy for entries with several matched rules.
    #[serde(default)]
    pub posting_policy: PostingPolicy,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or holds values
    /// the ledger cannot honor.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BURSAR").separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.reconciliation.validate()?;
        Ok(loaded)
    }
}

/// Shared, explicitly reloadable configuration.
///
/// Cloning the handle shares the same underlying value. Readers take a
/// snapshot with [`ConfigHandle::current`]; a reload swaps the snapshot for
/// all subsequent readers and never mutates one in flight.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<AppConfig>>>,
}

impl ConfigHandle {
    /// Wraps an already-loaded configuration.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Returns the current configuration snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<AppConfig> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the configuration with `config`.
    pub fn replace(&self, config: AppConfig) -> Arc<AppConfig> {
        let next = Arc::new(config);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        next
    }

    /// Re-reads configuration sources and swaps in the result.
    ///
    /// On failure the previous configuration stays in effect.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn reload(&self) -> Result<Arc<AppConfig>, config::ConfigError> {
        let loaded = AppConfig::load()?;
        Ok(self.replace(loaded))
    }
}
