//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::backend::MAX_UPLOAD_BYTES;
use crate::error::ConfigError;

/// Storage bucket used when `LOVESPARK_BUCKET` is unset.
pub const DEFAULT_BUCKET: &str = "user-images";

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the local libSQL database holding persisted settings.
    pub db_path: PathBuf,
    /// Port for the HTTP surface.
    pub port: u16,
    /// How often the background task checks for a weekly swipe refill.
    pub reset_check_interval: Duration,
    /// Remote backend, if one is configured. Without it the demo stores are used.
    pub backend: Option<BackendConfig>,
    /// Fallback user id when no backend auth is available.
    pub user_id: Option<String>,
    /// Settings applied to the onboarding wizard.
    pub onboarding: OnboardingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/lovespark.db"),
            port: 8080,
            reset_check_interval: Duration::from_secs(24 * 60 * 60), // daily
            backend: None,
            user_id: None,
            onboarding: OnboardingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from `LOVESPARK_*` environment variables,
    /// falling back to defaults for anything unset or unparseable. Only a
    /// half-configured backend is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = std::env::var("LOVESPARK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let port: u16 = std::env::var("LOVESPARK_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let reset_check_interval = std::env::var("LOVESPARK_RESET_CHECK_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.reset_check_interval);

        let user_id = std::env::var("LOVESPARK_USER_ID")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            db_path,
            port,
            reset_check_interval,
            backend: BackendConfig::from_env()?,
            user_id,
            onboarding: OnboardingConfig::from_env(),
        })
    }
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Project API key sent as `apikey`.
    pub api_key: SecretString,
    /// Access token of the signed-in user, if any.
    pub access_token: Option<SecretString>,
    /// Storage bucket for profile images.
    pub bucket: String,
}

impl BackendConfig {
    /// `Ok(None)` when neither `LOVESPARK_BACKEND_URL` nor
    /// `LOVESPARK_BACKEND_KEY` is set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let var = |name: &str| std::env::var(name).ok().filter(|s| !s.trim().is_empty());
        Self::from_parts(
            var("LOVESPARK_BACKEND_URL"),
            var("LOVESPARK_BACKEND_KEY"),
            var("LOVESPARK_ACCESS_TOKEN"),
            var("LOVESPARK_BUCKET"),
        )
    }

    fn from_parts(
        url: Option<String>,
        api_key: Option<String>,
        access_token: Option<String>,
        bucket: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let (url, api_key) = match (url, api_key) {
            (None, None) => return Ok(None),
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("LOVESPARK_BACKEND_KEY".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("LOVESPARK_BACKEND_URL".to_string()));
            }
            (Some(url), Some(key)) => (url, key),
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "LOVESPARK_BACKEND_URL".to_string(),
                message: format!("expected an http(s) URL, got {url:?}"),
            });
        }

        Ok(Some(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key),
            access_token: access_token.map(SecretString::from),
            bucket: bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        }))
    }
}

/// Onboarding wizard settings.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Largest accepted photo, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl OnboardingConfig {
    pub fn from_env() -> Self {
        let max_upload_bytes = std::env::var("LOVESPARK_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(MAX_UPLOAD_BYTES);
        Self { max_upload_bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_check_daily() {
        let config = AppConfig::default();
        assert_eq!(config.reset_check_interval, Duration::from_secs(86_400));
        assert_eq!(config.port, 8080);
        assert!(config.backend.is_none());
        assert_eq!(config.onboarding.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn backend_needs_url_and_key() {
        assert!(BackendConfig::from_parts(None, None, None, None)
            .unwrap()
            .is_none());

        let err = BackendConfig::from_parts(Some("https://x.test".into()), None, None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "LOVESPARK_BACKEND_KEY"));

        let err = BackendConfig::from_parts(None, Some("key".into()), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "LOVESPARK_BACKEND_URL"));
    }

    #[test]
    fn backend_url_must_be_http() {
        let err = BackendConfig::from_parts(Some("x.test".into()), Some("key".into()), None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn backend_defaults_bucket_and_trims_url() {
        let config = BackendConfig::from_parts(
            Some("https://x.test/".into()),
            Some("key".into()),
            Some("token".into()),
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.url, "https://x.test");
        assert_eq!(config.bucket, DEFAULT_BUCKET);
        assert!(config.access_token.is_some());
    }
}
