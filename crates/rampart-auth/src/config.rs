//! Token authority configuration.

use std::time::Duration;

use serde::Deserialize;

/// How long an issued token stays valid.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tokens closer to expiry than this are reissued on refresh.
const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Configuration for the [`SessionAuthority`](crate::SessionAuthority).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for token signatures.
    ///
    /// The default is a development-only value; production deployments must
    /// override it from their secret source.
    pub secret: String,

    /// Validity window of newly issued tokens.
    #[serde(with = "duration_secs")]
    pub token_ttl: Duration,

    /// Remaining-validity threshold under which `refresh` issues a new token.
    #[serde(with = "duration_secs")]
    pub refresh_window: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "rampart-dev-secret-override-in-production".to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
            refresh_window: DEFAULT_REFRESH_WINDOW,
        }
    }
}

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
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.refresh_window, Duration::from_secs(1_800));
    }

    #[test]
    fn test_deserialize_overrides() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"secret": "s3cret", "token_ttl": 3600}"#).unwrap();
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.refresh_window, Duration::from_secs(1_800));
    }
}
