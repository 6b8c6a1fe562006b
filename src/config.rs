//! Configuration types for ticker-dash

use crate::aggregator::AggregatorSettings;
use crate::currency::ConversionTable;
use crate::feed::{FeedSettings, BINANCE_WS_URL};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::registry::{Symbol, SymbolRegistry, DEFAULT_QUOTE_ASSET};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure; every section is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Replaces the built-in symbol catalog when non-empty
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

/// Upstream feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Consecutive automatic reconnects before going offline
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Reconnect when no frame arrives for this long (disabled when unset)
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_endpoint() -> String {
    BINANCE_WS_URL.to_string()
}
fn default_quote_asset() -> String {
    DEFAULT_QUOTE_ASSET.to_string()
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}
fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            quote_asset: default_quote_asset(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            idle_timeout_secs: None,
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

/// Aggregation and presentation defaults
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_display_currency")]
    pub display_currency: String,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Where the display order is persisted; kept in memory when unset
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

fn default_display_currency() -> String {
    "USD".to_string()
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            display_currency: default_display_currency(),
            history_capacity: default_history_capacity(),
            preferences_path: None,
        }
    }
}

/// Rate overrides on top of the built-in table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            endpoint: self.feed.endpoint.clone(),
            quote_asset: self.feed.quote_asset.to_uppercase(),
            max_reconnect_attempts: self.feed.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.feed.reconnect_delay_ms),
            idle_timeout: self.feed.idle_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            quote_asset: self.feed.quote_asset.to_uppercase(),
            history_capacity: self.dashboard.history_capacity,
            display_currency: self.dashboard.display_currency.clone(),
        }
    }

    pub fn registry(&self) -> SymbolRegistry {
        if self.symbols.is_empty() {
            SymbolRegistry::default()
        } else {
            SymbolRegistry::new(self.symbols.clone())
        }
    }

    pub fn conversion_table(&self) -> ConversionTable {
        let mut table = ConversionTable::default();
        table.extend(&self.currency.rates);
        table
    }
}
