//! Configuration for release-relay
//! Searched in order: relay.toml, .relay.toml, .config/relay.toml
//!
//! The risk-parameter table and rollout phase plan are configuration, not
//! module-level constants, so test fixtures can inject alternate tables.

use crate::core::error::{ConfigError, RelayError, RelayResult, ResultExt};
use crate::risk::RiskLevel;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from relay.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelayConfig {
  #[serde(default)]
  pub risk: RiskTable,
  #[serde(default)]
  pub scheduling: ScheduleConfig,
  #[serde(default)]
  pub flags: FlagConfig,
  #[serde(default)]
  pub oracle: OracleConfig,
}

/// Numeric parameters derived from a risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
  /// Hours of post-deployment monitoring
  pub monitoring_hours: u32,
  /// Target minutes for a complete rollback
  pub rollback_threshold_minutes: u32,
}

/// Risk tier → numeric parameter lookup table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTable {
  #[serde(default = "default_low")]
  pub low: RiskParams,
  #[serde(default = "default_medium")]
  pub medium: RiskParams,
  #[serde(default = "default_high")]
  pub high: RiskParams,
  #[serde(default = "default_critical")]
  pub critical: RiskParams,
}

fn default_low() -> RiskParams {
  RiskParams {
    monitoring_hours: 2,
    rollback_threshold_minutes: 30,
  }
}

fn default_medium() -> RiskParams {
  RiskParams {
    monitoring_hours: 6,
    rollback_threshold_minutes: 15,
  }
}

fn default_high() -> RiskParams {
  RiskParams {
    monitoring_hours: 24,
    rollback_threshold_minutes: 5,
  }
}

fn default_critical() -> RiskParams {
  RiskParams {
    monitoring_hours: 48,
    rollback_threshold_minutes: 2,
  }
}

impl Default for RiskTable {
  fn default() -> Self {
    Self {
      low: default_low(),
      medium: default_medium(),
      high: default_high(),
      critical: default_critical(),
    }
  }
}

impl RiskTable {
  /// Look up parameters for a risk tier
  pub fn params(&self, level: RiskLevel) -> RiskParams {
    match level {
      RiskLevel::Low => self.low,
      RiskLevel::Medium => self.medium,
      RiskLevel::High => self.high,
      RiskLevel::Critical => self.critical,
    }
  }
}

/// Deployment window scheduling constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
  /// Dates on which no deployment may be scheduled
  #[serde(default)]
  pub blackout_dates: Vec<NaiveDate>,

  /// Preferred weekdays ("mon".."sun"); a bias, never a hard constraint
  #[serde(default = "default_preferred_days")]
  pub preferred_days: Vec<String>,

  /// Start of team availability, hour of day (0-23)
  #[serde(default = "default_availability_start")]
  pub availability_start_hour: u32,

  /// End of team availability, hour of day (1-23); windows end on the hour
  #[serde(default = "default_availability_end")]
  pub availability_end_hour: u32,

  /// Deployment window length in hours
  #[serde(default = "default_window_hours")]
  pub window_hours: u32,

  /// How many days ahead to search for a valid window
  #[serde(default = "default_lookahead_days")]
  pub lookahead_days: u32,
}

fn default_preferred_days() -> Vec<String> {
  vec!["tue".to_string(), "wed".to_string(), "thu".to_string()]
}

fn default_availability_start() -> u32 {
  9
}

fn default_availability_end() -> u32 {
  17
}

fn default_window_hours() -> u32 {
  2
}

fn default_lookahead_days() -> u32 {
  21
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self {
      blackout_dates: Vec::new(),
      preferred_days: default_preferred_days(),
      availability_start_hour: default_availability_start(),
      availability_end_hour: default_availability_end(),
      window_hours: default_window_hours(),
      lookahead_days: default_lookahead_days(),
    }
  }
}

impl ScheduleConfig {
  /// Parse the preferred weekday names into chrono weekdays
  /// Unknown names are ignored (validate() rejects them up front)
  pub fn preferred_weekdays(&self) -> Vec<Weekday> {
    self.preferred_days.iter().filter_map(|d| parse_weekday(d)).collect()
  }
}

/// Parse a short or full weekday name
pub fn parse_weekday(name: &str) -> Option<Weekday> {
  match name.to_lowercase().as_str() {
    "mon" | "monday" => Some(Weekday::Mon),
    "tue" | "tuesday" => Some(Weekday::Tue),
    "wed" | "wednesday" => Some(Weekday::Wed),
    "thu" | "thursday" => Some(Weekday::Thu),
    "fri" | "friday" => Some(Weekday::Fri),
    "sat" | "saturday" => Some(Weekday::Sat),
    "sun" | "sunday" => Some(Weekday::Sun),
    _ => None,
  }
}

/// A single rollout phase: exposure percentage held for a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseConfig {
  pub percentage: u8,
  pub duration_hours: u32,
}

/// Feature flag rollout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagConfig {
  /// Phase plan applied to newly created flags
  #[serde(default = "default_phases")]
  pub default_phases: Vec<PhaseConfig>,

  /// Days a flag must sit at 100% before it is cleanup-eligible
  #[serde(default = "default_cleanup_aging_days")]
  pub cleanup_aging_days: u32,
}

fn default_phases() -> Vec<PhaseConfig> {
  vec![
    PhaseConfig {
      percentage: 5,
      duration_hours: 24,
    },
    PhaseConfig {
      percentage: 25,
      duration_hours: 24,
    },
    PhaseConfig {
      percentage: 50,
      duration_hours: 48,
    },
    PhaseConfig {
      percentage: 100,
      duration_hours: 0,
    },
  ]
}

fn default_cleanup_aging_days() -> u32 {
  30
}

impl Default for FlagConfig {
  fn default() -> Self {
    Self {
      default_phases: default_phases(),
      cleanup_aging_days: default_cleanup_aging_days(),
    }
  }
}

/// Assessment oracle call settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
  /// Per-call timeout in seconds
  #[serde(default = "default_oracle_timeout")]
  pub timeout_secs: u64,
}

fn default_oracle_timeout() -> u64 {
  20
}

impl Default for OracleConfig {
  fn default() -> Self {
    Self {
      timeout_secs: default_oracle_timeout(),
    }
  }
}

impl RelayConfig {
  /// Find config file in search order: relay.toml, .relay.toml, .config/relay.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("relay.toml"),
      path.join(".relay.toml"),
      path.join(".config").join("relay.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from relay.toml (searches multiple locations)
  pub fn load(path: &Path) -> RelayResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      RelayError::Config(ConfigError::NotFound {
        workspace_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: RelayConfig = toml_edit::de::from_str(&content)
      .map_err(|e| RelayError::Config(ConfigError::Parse(format!("{}: {}", config_path.display(), e))))?;

    config.validate()?;

    Ok(config)
  }

  /// Save config to relay.toml (default location)
  pub fn save(&self, path: &Path) -> RelayResult<()> {
    let config_path = path.join("relay.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }

  /// Validate configuration values
  pub fn validate(&self) -> RelayResult<()> {
    if self.scheduling.availability_start_hour >= self.scheduling.availability_end_hour {
      return Err(
        ConfigError::Invalid(format!(
          "availability_start_hour ({}) must be before availability_end_hour ({})",
          self.scheduling.availability_start_hour, self.scheduling.availability_end_hour
        ))
        .into(),
      );
    }

    // Windows end on the hour, so availability must close before midnight
    if self.scheduling.availability_end_hour > 23 {
      return Err(ConfigError::Invalid("availability_end_hour must be at most 23".to_string()).into());
    }

    if self.scheduling.lookahead_days == 0 {
      return Err(ConfigError::Invalid("lookahead_days must be at least 1".to_string()).into());
    }

    if self.scheduling.window_hours == 0 {
      return Err(ConfigError::Invalid("window_hours must be at least 1".to_string()).into());
    }

    let availability_span = self.scheduling.availability_end_hour - self.scheduling.availability_start_hour;
    if self.scheduling.window_hours > availability_span {
      return Err(
        ConfigError::Invalid(format!(
          "window_hours ({}) exceeds team availability span ({}h)",
          self.scheduling.window_hours, availability_span
        ))
        .into(),
      );
    }

    for day in &self.scheduling.preferred_days {
      if parse_weekday(day).is_none() {
        return Err(ConfigError::Invalid(format!("unknown weekday '{}' in preferred_days", day)).into());
      }
    }

    let phases = &self.flags.default_phases;
    if phases.is_empty() {
      return Err(ConfigError::Invalid("default_phases must not be empty".to_string()).into());
    }
    if phases.last().map(|p| p.percentage) != Some(100) {
      return Err(ConfigError::Invalid("last rollout phase must be 100%".to_string()).into());
    }
    for pair in phases.windows(2) {
      if pair[1].percentage <= pair[0].percentage {
        return Err(
          ConfigError::Invalid(format!(
            "rollout phases must strictly increase: {}% then {}%",
            pair[0].percentage, pair[1].percentage
          ))
          .into(),
        );
      }
    }

    Ok(())
  }
}
