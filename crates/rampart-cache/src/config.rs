//! Cache facade configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default staleness window for cached health-probe results.
const DEFAULT_HEALTH_WINDOW: Duration = Duration::from_secs(5);

/// Default timeout for a single health probe.
///
/// Kept aggressively short so an unhealthy backend cannot stall request
/// handling while the probe waits.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for a [`CacheFacade`](crate::CacheFacade) instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Remote backend connection URL (e.g. `redis://127.0.0.1:6379`).
    ///
    /// `None` means the remote backend is never configured and the facade
    /// serves everything from the in-process store.
    pub redis_url: Option<String>,

    /// Path of the fallback store's persistence file.
    pub persist_path: PathBuf,

    /// How long a health-probe result is trusted before a fresh probe runs.
    #[serde(with = "duration_secs")]
    pub health_check_window: Duration,

    /// Upper bound on how long a single health probe may take.
    #[serde(with = "duration_secs")]
    pub health_probe_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            persist_path: PathBuf::from("cache_persistence.json"),
            health_check_window: DEFAULT_HEALTH_WINDOW,
            health_probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Serde adapter for durations expressed as seconds in config sources.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.health_check_window, Duration::from_secs(5));
        assert_eq!(config.health_probe_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"redis_url": "redis://localhost:6379"}"#).unwrap();
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.health_check_window, Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize_durations_as_seconds() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"health_check_window": 10, "health_probe_timeout": 0.25}"#)
                .unwrap();
        assert_eq!(config.health_check_window, Duration::from_secs(10));
        assert_eq!(config.health_probe_timeout, Duration::from_millis(250));
    }
}
