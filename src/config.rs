//! Engine configuration.
//!
//! Serializable configuration for the proximity engine, loadable from JSON
//! while keeping complexity minimal.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Proximity engine configuration.
///
/// # Example
///
/// ```rust
/// use mpa_proximity::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cache_precision, 4);
///
/// let json = r#"{
///     "result_ttl_seconds": 60,
///     "cache_precision": 5,
///     "near_threshold_km": 10.0
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.near_threshold_km, 10.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// TTL for cached contexts in seconds.
    #[serde(default = "Config::default_result_ttl_seconds")]
    pub result_ttl_seconds: f64,

    /// Decimal places coordinates are rounded to when deriving cache keys
    /// (0-7). 4 decimal degrees is roughly 11 m, so nearby position
    /// reports share cache entries without changing which area they
    /// resolve to in practice.
    #[serde(default = "Config::default_cache_precision")]
    pub cache_precision: usize,

    /// Distance in kilometers under which a point counts as "near" the
    /// nearest area.
    #[serde(default = "Config::default_near_threshold_km")]
    pub near_threshold_km: f64,

    /// Upper bound on worker threads used by batch context evaluation.
    #[serde(default = "Config::default_batch_workers")]
    pub batch_workers: usize,

    /// Whether a query against a cold boundary cache triggers a lazy
    /// rebuild. When false, such queries fail with `NotWarmed` and the
    /// caller must invoke `warm_cache` explicitly.
    #[serde(default = "Config::default_rebuild_on_miss")]
    pub rebuild_on_miss: bool,
}

impl Config {
    const fn default_result_ttl_seconds() -> f64 {
        300.0
    }

    const fn default_cache_precision() -> usize {
        4
    }

    const fn default_near_threshold_km() -> f64 {
        5.0
    }

    const fn default_batch_workers() -> usize {
        4
    }

    const fn default_rebuild_on_miss() -> bool {
        true
    }

    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl_seconds = ttl.as_secs_f64();
        self
    }

    pub fn with_cache_precision(mut self, precision: usize) -> Self {
        assert!(
            precision <= 7,
            "Cache precision must be between 0 and 7 decimal places"
        );
        self.cache_precision = precision;
        self
    }

    pub fn with_near_threshold_km(mut self, km: f64) -> Self {
        self.near_threshold_km = km;
        self
    }

    pub fn with_batch_workers(mut self, workers: usize) -> Self {
        assert!(workers > 0, "Batch worker count must be greater than zero");
        self.batch_workers = workers;
        self
    }

    pub fn with_rebuild_on_miss(mut self, rebuild: bool) -> Self {
        self.rebuild_on_miss = rebuild;
        self
    }

    /// Effective result TTL as a `Duration`. Non-finite or non-positive
    /// values collapse to zero (entries expire immediately); values past
    /// `Duration`'s range saturate to `Duration::MAX`.
    pub fn result_ttl(&self) -> Duration {
        if !self.result_ttl_seconds.is_finite() || self.result_ttl_seconds <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.result_ttl_seconds).unwrap_or(Duration::MAX)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !self.result_ttl_seconds.is_finite() || self.result_ttl_seconds < 0.0 {
            return Err("Result TTL must be finite and non-negative".to_string());
        }
        if self.cache_precision > 7 {
            return Err("Cache precision must be between 0 and 7 decimal places".to_string());
        }
        if !self.near_threshold_km.is_finite() || self.near_threshold_km < 0.0 {
            return Err("Near threshold must be finite and non-negative".to_string());
        }
        if self.batch_workers == 0 {
            return Err("Batch worker count must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            result_ttl_seconds: Self::default_result_ttl_seconds(),
            cache_precision: Self::default_cache_precision(),
            near_threshold_km: Self::default_near_threshold_km(),
            batch_workers: Self::default_batch_workers(),
            rebuild_on_miss: Self::default_rebuild_on_miss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.result_ttl_seconds, 300.0);
        assert_eq!(config.cache_precision, 4);
        assert_eq!(config.near_threshold_km, 5.0);
        assert_eq!(config.batch_workers, 4);
        assert!(config.rebuild_on_miss);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = Config::default()
            .with_result_ttl(Duration::from_secs(60))
            .with_cache_precision(5)
            .with_near_threshold_km(2.0)
            .with_batch_workers(8)
            .with_rebuild_on_miss(false);

        assert_eq!(config.result_ttl(), Duration::from_secs(60));
        assert_eq!(config.cache_precision, 5);
        assert_eq!(config.near_threshold_km, 2.0);
        assert_eq!(config.batch_workers, 8);
        assert!(!config.rebuild_on_miss);
    }

    #[test]
    #[should_panic(expected = "Cache precision must be between 0 and 7")]
    fn test_config_invalid_precision() {
        let _ = Config::default().with_cache_precision(9);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.result_ttl_seconds = f64::NAN;
        assert!(config.validate().is_err());

        config.result_ttl_seconds = -1.0;
        assert!(config.validate().is_err());

        config.result_ttl_seconds = 300.0;
        config.batch_workers = 0;
        assert!(config.validate().is_err());

        config.batch_workers = 4;
        config.near_threshold_km = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_cache_precision(5)
            .with_near_threshold_km(10.0);

        let json = config.to_json().unwrap();
        let back = Config::from_json(&json).unwrap();
        assert_eq!(back.cache_precision, 5);
        assert_eq!(back.near_threshold_km, 10.0);
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let json = r#"{ "cache_precision": 12 }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_result_ttl_safe_conversion() {
        let mut config = Config::default();
        config.result_ttl_seconds = 0.0;
        assert_eq!(config.result_ttl(), Duration::ZERO);

        config.result_ttl_seconds = f64::NAN;
        assert_eq!(config.result_ttl(), Duration::ZERO);

        // Finite but beyond Duration's range: saturate, never panic.
        config.result_ttl_seconds = 1e20;
        assert!(config.validate().is_ok());
        assert_eq!(config.result_ttl(), Duration::MAX);
    }
}
