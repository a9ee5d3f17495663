//! Provider settings and their environment fallbacks

use std::fmt;
use thiserror::Error;

use crate::api::DEFAULT_ENDPOINT;

pub const ENV_REGION: &str = "UCLOUD_REGION";
pub const ENV_ZONE: &str = "UCLOUD_ZONE";
pub const ENV_PROJECT_ID: &str = "UCLOUD_PROJECT_ID";
pub const ENV_PUBLIC_KEY: &str = "UCLOUD_PUBLIC_KEY";
pub const ENV_PRIVATE_KEY: &str = "UCLOUD_PRIVATE_KEY";
pub const ENV_API_ENDPOINT: &str = "UCLOUD_API_ENDPOINT";

/// Explicitly configured values. Anything left `None` (or empty) falls back
/// to the matching environment variable.
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub region: Option<String>,
    pub zone: Option<String>,
    pub project_id: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("region", &self.region)
            .field("zone", &self.zone)
            .field("project_id", &self.project_id)
            .field("public_key", &self.public_key)
            .field("private_key", &redact(&self.private_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Stands in for a secret in `Debug` output.
pub(crate) fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

/// Fully resolved settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub region: String,
    pub zone: String,
    pub project_id: String,
    pub public_key: String,
    pub private_key: String,
    pub base_url: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("zone", &self.zone)
            .field("project_id", &self.project_id)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSetting {
    pub attribute: &'static str,
    pub env_var: &'static str,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing provider settings: {}", .0.iter().map(|m| m.attribute).collect::<Vec<_>>().join(", "))]
    Missing(Vec<MissingSetting>),
}

impl ProviderSettings {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ProviderConfig, ConfigError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with `env` standing in for the process environment.
    pub fn resolve_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderConfig, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |value: &Option<String>, attribute: &'static str, env_var: &'static str| {
            match pick(value, &env, env_var) {
                Some(value) => value,
                None => {
                    missing.push(MissingSetting { attribute, env_var });
                    String::new()
                }
            }
        };

        let region = required(&self.region, "region", ENV_REGION);
        let zone = required(&self.zone, "zone", ENV_ZONE);
        let project_id = required(&self.project_id, "project_id", ENV_PROJECT_ID);
        let public_key = required(&self.public_key, "public_key", ENV_PUBLIC_KEY);
        let private_key = required(&self.private_key, "private_key", ENV_PRIVATE_KEY);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let base_url = pick(&self.base_url, &env, ENV_API_ENDPOINT)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(ProviderConfig {
            region,
            zone,
            project_id,
            public_key,
            private_key,
            base_url,
        })
    }
}

fn pick(
    explicit: &Option<String>,
    env: &impl Fn(&str) -> Option<String>,
    env_var: &str,
) -> Option<String> {
    explicit
        .clone()
        .filter(|value| !value.is_empty())
        .or_else(|| env(env_var).filter(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env_from(&[
            (ENV_REGION, "cn-bj2"),
            (ENV_ZONE, "cn-bj2-02"),
            (ENV_PROJECT_ID, "org-env"),
            (ENV_PUBLIC_KEY, "env-public"),
            (ENV_PRIVATE_KEY, "env-private"),
        ])
    }

    #[test]
    fn environment_fills_unset_values() {
        let config = ProviderSettings::default().resolve_with(full_env()).unwrap();

        assert_eq!(config.region, "cn-bj2");
        assert_eq!(config.project_id, "org-env");
        assert_eq!(config.base_url, DEFAULT_ENDPOINT);
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let settings = ProviderSettings {
            project_id: Some("org-explicit".to_string()),
            base_url: Some("http://localhost:8080".to_string()),
            ..ProviderSettings::default()
        };
        let config = settings.resolve_with(full_env()).unwrap();

        assert_eq!(config.project_id, "org-explicit");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn empty_values_count_as_missing() {
        let settings = ProviderSettings {
            region: Some(String::new()),
            ..ProviderSettings::default()
        };
        let err = settings
            .resolve_with(env_from(&[
                (ENV_ZONE, "cn-bj2-02"),
                (ENV_PROJECT_ID, "org-env"),
                (ENV_PUBLIC_KEY, ""),
            ]))
            .unwrap_err();

        let ConfigError::Missing(missing) = err;
        let attributes: Vec<&str> = missing.iter().map(|m| m.attribute).collect();
        assert_eq!(attributes, vec!["region", "public_key", "private_key"]);
        assert_eq!(missing[0].env_var, ENV_REGION);
    }

    #[test]
    fn debug_output_redacts_private_key() {
        let config = ProviderSettings::default().resolve_with(full_env()).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("env-private"));
        assert!(debug.contains("<redacted>"));
    }
}
