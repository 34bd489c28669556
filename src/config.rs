//! 运行时配置
//!
//! Values are looked up by key with a default for anything missing. Native code
//! reads the process environment; the browser build passes `option_env!` values.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://one-roof-a12-server.vercel.app";

pub const ENV_API_URL: &str = "ONEROOF_API_URL";
pub const ENV_STRIPE_KEY: &str = "ONEROOF_STRIPE_KEY";
pub const ENV_FIREBASE_API_KEY: &str = "ONEROOF_FIREBASE_API_KEY";
pub const ENV_FIREBASE_AUTH_DOMAIN: &str = "ONEROOF_FIREBASE_AUTH_DOMAIN";
pub const ENV_FIREBASE_PROJECT_ID: &str = "ONEROOF_FIREBASE_PROJECT_ID";
pub const ENV_FIREBASE_APP_ID: &str = "ONEROOF_FIREBASE_APP_ID";

/// Passed verbatim to `firebase.initializeApp`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub app_id: String,
}

impl FirebaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.project_id.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// REST backend root, without a trailing slash.
    pub api_base_url: String,
    /// Stripe publishable key (`pk_...`); empty disables card payments.
    pub stripe_publishable_key: String,
    pub firebase: FirebaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_base_url: var(ENV_API_URL)
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            stripe_publishable_key: var(ENV_STRIPE_KEY).unwrap_or_default(),
            firebase: FirebaseConfig {
                api_key: var(ENV_FIREBASE_API_KEY).unwrap_or_default(),
                auth_domain: var(ENV_FIREBASE_AUTH_DOMAIN).unwrap_or_default(),
                project_id: var(ENV_FIREBASE_PROJECT_ID).unwrap_or_default(),
                app_id: var(ENV_FIREBASE_APP_ID).unwrap_or_default(),
            },
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(AppError::validation(format!(
                "{} must be an http(s) URL, got {:?}",
                ENV_API_URL, self.api_base_url
            )));
        }
        if !self.stripe_publishable_key.is_empty() && !self.stripe_publishable_key.starts_with("pk_")
        {
            return Err(AppError::validation(format!(
                "{} must be a publishable key (pk_...)",
                ENV_STRIPE_KEY
            )));
        }
        Ok(())
    }

    pub fn payments_enabled(&self) -> bool {
        !self.stripe_publishable_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!config.payments_enabled());
        assert!(!config.firebase.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides_and_trims() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "http://localhost:5000/ "),
            (ENV_STRIPE_KEY, "pk_test_123"),
            (ENV_FIREBASE_API_KEY, "abc"),
            (ENV_FIREBASE_PROJECT_ID, "one-roof"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert!(config.payments_enabled());
        assert!(config.firebase.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_stripe_key_is_rejected() {
        let config = AppConfig::from_lookup(|k| (k == ENV_STRIPE_KEY).then(|| "sk_live_x".to_string()));
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }
}
