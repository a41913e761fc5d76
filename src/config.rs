use std::env;
use std::fmt;
use std::time::Duration;

use crate::artifact::RenderStrategy;

/// Longest visibility window a slot accepts.
pub const MAX_VISIBILITY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
/// Pixels per QR module. Together with `MAX_QUIET_ZONE` this keeps a version-40 image under 14k px.
pub const MAX_MODULE_SCALE: u32 = 64;
pub const MAX_QUIET_ZONE: u32 = 16;

// --- ERRORS ---

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "Config error: {} must be valid (got '{}')", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub slot: SlotConfig,
    pub artifact: ArtifactConfig,
}

impl Config {
    /// Reads every section from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            server: ServerConfig::load()?,
            broker: BrokerConfig::load()?,
            slot: SlotConfig::load()?,
            artifact: ArtifactConfig::load()?,
        })
    }
}

// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host:      get_env("HTTP_HOST", "127.0.0.1")?,
            port:      get_env("HTTP_PORT", "8080")?,
            log_level: get_env("QRFLASH_LOG", "info")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
        }
    }
}

// BROKER
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub channel: String,
}

impl BrokerConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host:    get_env("BROKER_HOST", "127.0.0.1")?,
            port:    get_env("BROKER_PORT", "7654")?,
            channel: get_env("BROKER_CHANNEL", "qrflash/codes")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7654,
            channel: "qrflash/codes".to_string(),
        }
    }
}

// SLOT
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub visibility_window: Duration,
}

impl SlotConfig {
    fn load() -> Result<Self, ConfigError> {
        let secs: u64 = get_env("QR_VISIBILITY_SECS", "30")?;
        Self::from_secs(secs)
    }

    fn from_secs(secs: u64) -> Result<Self, ConfigError> {
        let secs = in_range("QR_VISIBILITY_SECS", secs, 1, MAX_VISIBILITY_WINDOW.as_secs())?;
        Ok(Self::with_window(Duration::from_secs(secs)))
    }

    pub fn with_window(visibility_window: Duration) -> Self {
        Self { visibility_window }
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::with_window(Duration::from_secs(30))
    }
}

// ARTIFACT
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub strategy: RenderStrategy,
    pub module_scale: u32,
    pub quiet_zone: u32,
}

impl ArtifactConfig {
    fn load() -> Result<Self, ConfigError> {
        Self::checked(
            get_env("ARTIFACT_STRATEGY", "lazy")?,
            get_env("QR_MODULE_SCALE", "8")?,
            get_env("QR_QUIET_ZONE", "4")?,
        )
    }

    fn checked(strategy: RenderStrategy, module_scale: u32, quiet_zone: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            strategy,
            module_scale: in_range("QR_MODULE_SCALE", module_scale, 1, MAX_MODULE_SCALE)?,
            quiet_zone:   in_range("QR_QUIET_ZONE", quiet_zone, 0, MAX_QUIET_ZONE)?,
        })
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            strategy: RenderStrategy::Lazy,
            module_scale: 8,
            quiet_zone: 4,
        }
    }
}

// --- PRIVATE HELPER ---

fn get_env<T: std::str::FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, raw)
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw.clone() })
}

fn in_range<T>(key: &'static str, value: T, min: T, max: T) -> Result<T, ConfigError>
where
    T: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::Invalid { key, value: value.to_string() });
    }
    Ok(value)
}
