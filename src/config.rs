use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use crate::error::ConfigError;
use crate::models::MINOR_UNITS_PER_TON;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub wallet: WalletConfig,
    pub tonapi: TonApiConfig,
    pub telegram: TelegramConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

/// Watched account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Account address as accepted by TonAPI (raw or user-friendly form)
    pub address: String,
    /// Base URL of the explorer; the account address is appended
    pub explorer_url: String,
}

/// TonAPI read endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TonApiConfig {
    /// TonAPI base URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Telegram delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API base URL
    pub api_url: String,
    pub bot_token: String,
    /// Destination chat or channel id
    pub chat_id: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Minimum notifiable amount in TON
    pub min_amount: f64,
    /// Sleep between cycles in seconds
    pub poll_interval_seconds: u64,
    /// Number of most recent transactions considered per cycle
    pub window_size: usize,
    /// Path of the JSON dedup ledger
    pub ledger_path: String,
    /// Fixed UTC offset, in hours, used when rendering timestamps
    pub display_utc_offset_hours: i32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            explorer_url: "https://tonviewer.com".to_string(),
        }
    }
}

impl Default for TonApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://tonapi.io".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_amount: 5.0,
            poll_interval_seconds: 60,
            window_size: 4,
            ledger_path: "processed_txs.json".to_string(),
            display_utc_offset_hours: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw,
    })
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file, falling back to defaults when absent
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(address) = env::var("WALLET_ADDRESS") {
            self.wallet.address = address.trim().to_string();
        }
        if let Ok(url) = env::var("EXPLORER_URL") {
            self.wallet.explorer_url = url;
        }

        if let Ok(endpoint) = env::var("TONAPI_URL") {
            self.tonapi.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("TONAPI_TIMEOUT_SECONDS") {
            self.tonapi.timeout_seconds = parse_env("TONAPI_TIMEOUT_SECONDS", timeout)?;
        }

        if let Ok(url) = env::var("TELEGRAM_API_URL") {
            self.telegram.api_url = url;
        }
        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Ok(chat_id) = env::var("TELEGRAM_CHANNEL_ID") {
            self.telegram.chat_id = chat_id.trim().to_string();
        }

        if let Ok(min_amount) = env::var("MIN_AMOUNT") {
            self.processing.min_amount = parse_env("MIN_AMOUNT", min_amount)?;
        }
        if let Ok(interval) = env::var("POLL_INTERVAL_SECONDS") {
            self.processing.poll_interval_seconds = parse_env("POLL_INTERVAL_SECONDS", interval)?;
        }
        if let Ok(window) = env::var("TX_WINDOW_SIZE") {
            self.processing.window_size = parse_env("TX_WINDOW_SIZE", window)?;
        }
        if let Ok(path) = env::var("LEDGER_PATH") {
            self.processing.ledger_path = path;
        }
        if let Ok(offset) = env::var("DISPLAY_UTC_OFFSET_HOURS") {
            self.processing.display_utc_offset_hours = parse_env("DISPLAY_UTC_OFFSET_HOURS", offset)?;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet.address.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("WALLET_ADDRESS".to_string()));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("TELEGRAM_CHANNEL_ID".to_string()));
        }

        for url in [&self.tonapi.endpoint, &self.telegram.api_url, &self.wallet.explorer_url] {
            if !is_http_url(url) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }

        for (key, timeout) in [
            ("tonapi.timeout_seconds", self.tonapi.timeout_seconds),
            ("telegram.timeout_seconds", self.telegram.timeout_seconds),
        ] {
            if timeout == 0 || timeout > 300 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: timeout.to_string(),
                });
            }
        }

        if !self.processing.min_amount.is_finite() || self.processing.min_amount < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.min_amount".to_string(),
                value: self.processing.min_amount.to_string(),
            });
        }

        if self.processing.poll_interval_seconds == 0 || self.processing.poll_interval_seconds > 3600 {
            return Err(ConfigError::InvalidValue {
                key: "processing.poll_interval_seconds".to_string(),
                value: self.processing.poll_interval_seconds.to_string(),
            });
        }

        if self.processing.window_size == 0 || self.processing.window_size > 100 {
            return Err(ConfigError::InvalidValue {
                key: "processing.window_size".to_string(),
                value: self.processing.window_size.to_string(),
            });
        }

        if self.processing.ledger_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "processing.ledger_path".to_string(),
                value: self.processing.ledger_path.clone(),
            });
        }

        self.display_offset()?;

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Minimum notifiable amount expressed in nanotons
    pub fn min_amount_minor(&self) -> u64 {
        (self.processing.min_amount * MINOR_UNITS_PER_TON as f64).round() as u64
    }

    /// Display timezone for rendered timestamps
    pub fn display_offset(&self) -> Result<FixedOffset, ConfigError> {
        let hours = self.processing.display_utc_offset_hours;
        if !(-12..=14).contains(&hours) {
            return Err(ConfigError::InvalidValue {
                key: "processing.display_utc_offset_hours".to_string(),
                value: hours.to_string(),
            });
        }
        FixedOffset::east_opt(hours * 3600).ok_or_else(|| ConfigError::InvalidValue {
            key: "processing.display_utc_offset_hours".to_string(),
            value: hours.to_string(),
        })
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}
