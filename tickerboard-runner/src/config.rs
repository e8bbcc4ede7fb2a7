//! Dashboard configuration, loaded from an optional TOML file.
//!
//! Every key is optional; missing sections and keys fall back to the
//! built-in defaults, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickerboard_core::data::{CircuitBreaker, PriceAdjustment, YahooSettings};
use tickerboard_core::domain::{AssetClass, Period, Symbol};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub defaults: DefaultsConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub circuit_breaker_cooldown_secs: u64,
    /// Split/dividend-adjusted closes; `false` asks for raw closes.
    pub adjusted: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            circuit_breaker_cooldown_secs: 30 * 60,
            adjusted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub asset_class: AssetClass,
    pub period: Period,
    pub stocks: Vec<Symbol>,
    pub crypto: Vec<Symbol>,
    pub selected_stocks: Vec<Symbol>,
    pub selected_crypto: Vec<Symbol>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            asset_class: AssetClass::default(),
            period: Period::default(),
            stocks: AssetClass::Stocks.default_universe(),
            crypto: AssetClass::Crypto.default_universe(),
            selected_stocks: AssetClass::Stocks.default_selection(),
            selected_crypto: AssetClass::Crypto.default_selection(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_volume: bool,
    pub log_scale: bool,
    /// KPI cards shown above the charts.
    pub kpi_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_volume: true,
            log_scale: false,
            kpi_limit: 4,
        }
    }
}

pub const MAX_KPI_CARDS: usize = 8;
pub const MAX_RETRIES: u32 = 10;

impl DashboardConfig {
    /// `<config_dir>/tickerboard/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tickerboard").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be positive".into()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be positive".into()));
        }
        if self.provider.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be at most {MAX_RETRIES}, got {}",
                self.provider.max_retries
            )));
        }
        if !(1..=MAX_KPI_CARDS).contains(&self.display.kpi_limit) {
            return Err(ConfigError::Invalid(format!(
                "display.kpi_limit must be between 1 and {MAX_KPI_CARDS}, got {}",
                self.display.kpi_limit
            )));
        }
        if self.defaults.stocks.is_empty() || self.defaults.crypto.is_empty() {
            return Err(ConfigError::Invalid("symbol universes must not be empty".into()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn yahoo_settings(&self) -> YahooSettings {
        YahooSettings {
            timeout: Duration::from_secs(self.provider.timeout_secs),
            max_retries: self.provider.max_retries,
            base_delay: Duration::from_millis(self.provider.base_delay_ms),
            ..YahooSettings::default()
        }
    }

    pub fn price_adjustment(&self) -> PriceAdjustment {
        if self.provider.adjusted {
            PriceAdjustment::Adjusted
        } else {
            PriceAdjustment::Raw
        }
    }

    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(Duration::from_secs(self.provider.circuit_breaker_cooldown_secs))
    }

    pub fn universe(&self, class: AssetClass) -> &[Symbol] {
        match class {
            AssetClass::Stocks => &self.defaults.stocks,
            AssetClass::Crypto => &self.defaults.crypto,
        }
    }

    pub fn default_selection(&self, class: AssetClass) -> &[Symbol] {
        match class {
            AssetClass::Stocks => &self.defaults.selected_stocks,
            AssetClass::Crypto => &self.defaults.selected_crypto,
        }
    }
}
