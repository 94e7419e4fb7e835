//! Configuration file support for kcal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/kcal/config.toml`.

use crate::{ActivityLevel, Error, Gender, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub profile: ProfileDefaults,

    #[serde(default)]
    pub notices: NoticeConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Starting values for the profile editor when no profile is stored
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileDefaults {
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    #[serde(default = "default_age")]
    pub age: u32,

    #[serde(default = "default_gender")]
    pub gender: Gender,

    #[serde(default = "default_activity")]
    pub activity: ActivityLevel,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            height: default_height(),
            age: default_age(),
            gender: default_gender(),
            activity: default_activity(),
        }
    }
}

/// Transient notice configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoticeConfig {
    #[serde(default = "default_notice_ttl")]
    pub ttl_seconds: i64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_notice_ttl(),
        }
    }
}

/// Longest lockout the auth policy accepts (one week)
pub const MAX_LOCKOUT_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Longest a notice may stay visible
pub const MAX_NOTICE_TTL_SECONDS: i64 = 60 * 60;

/// Local account policy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    #[serde(default = "default_lockout_seconds")]
    pub lockout_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_len: default_min_password_len(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_seconds: default_lockout_seconds(),
        }
    }
}

// Default value functions
fn home_fallback(relative: &str) -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(relative),
        None => PathBuf::from(".").join(relative),
    }
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_fallback(".local/share"));
    base.join("kcal")
}

fn default_weight() -> f64 {
    70.0
}

fn default_height() -> f64 {
    175.0
}

fn default_age() -> u32 {
    25
}

fn default_gender() -> Gender {
    Gender::Male
}

fn default_activity() -> ActivityLevel {
    ActivityLevel::Moderate
}

fn default_notice_ttl() -> i64 {
    4
}

fn default_min_password_len() -> usize {
    6
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lockout_seconds() -> i64 {
    300
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would make the editor or auth policy meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.profile.weight > 0.0) || !(self.profile.height > 0.0) {
            return Err(Error::Config(
                "profile weight and height defaults must be positive".into(),
            ));
        }
        if !(10..=120).contains(&self.profile.age) {
            return Err(Error::Config(
                "profile age default must be between 10 and 120".into(),
            ));
        }
        if !(1..=MAX_NOTICE_TTL_SECONDS).contains(&self.notices.ttl_seconds) {
            return Err(Error::Config(format!(
                "notices.ttl_seconds must be between 1 and {}",
                MAX_NOTICE_TTL_SECONDS
            )));
        }
        if self.auth.max_failed_attempts == 0 {
            return Err(Error::Config(
                "auth.max_failed_attempts must be at least 1".into(),
            ));
        }
        if !(1..=MAX_LOCKOUT_SECONDS).contains(&self.auth.lockout_seconds) {
            return Err(Error::Config(format!(
                "auth.lockout_seconds must be between 1 and {}",
                MAX_LOCKOUT_SECONDS
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_fallback(".config"));
        base.join("kcal").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
