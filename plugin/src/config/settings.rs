//! Plugin configuration
//!
//! Optional blocks (`docker`, `quota`, `health_check`) are `Option`s; their
//! presence is checked explicitly by the parameter resolver.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Deserialize;

use crate::logs::LogLevel;

/// Environment variable holding the registry password for private images
pub const DOCKER_PASSWORD_ENV: &str = "CF_DOCKER_PASSWORD";

/// Top level settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub json_logs: bool,

    pub platform: PlatformConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

impl Settings {
    /// Fill values that may come from the environment instead of the file
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(docker) = self.platform.docker.as_mut() {
            if docker.password.is_none() {
                docker.password = lookup(DOCKER_PASSWORD_ENV)
                    .filter(|p| !p.is_empty())
                    .map(SecretString::from);
            }
        }

        if self.release.domain.is_empty() {
            self.release.domain = self.platform.domain.clone();
        }
    }
}

/// Deploy stage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformConfig {
    pub organisation: String,

    pub space: String,

    pub domain: String,

    /// Registry credentials for private images
    #[serde(default)]
    pub docker: Option<DockerConfig>,

    #[serde(default)]
    pub quota: Option<QuotaConfig>,

    #[serde(default)]
    pub health_check: Option<HealthCheckConfig>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Contents of a dotenv style file, applied before `env`
    #[serde(default)]
    pub env_from_file: String,

    /// Names of service instances to bind
    #[serde(default)]
    pub service_bindings: Vec<String>,

    /// Duration string (`"90s"`, `"5m"`); empty means the default
    #[serde(default, alias = "deployment_timeout_seconds")]
    pub deployment_timeout: String,

    /// Upper bound for the build staging wait; empty means the default
    #[serde(default)]
    pub staging_timeout: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerConfig {
    pub username: String,

    /// Falls back to `CF_DOCKER_PASSWORD`
    #[serde(default)]
    pub password: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaConfig {
    /// Quantity string such as `"512Mi"` or `"1G"`
    #[serde(default)]
    pub memory: String,

    #[serde(default)]
    pub disk: String,

    #[serde(default)]
    pub instances: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthCheckConfig {
    /// `port`, `process` or `http`
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub endpoint: String,

    /// Seconds
    #[serde(default)]
    pub invocation_timeout: i64,

    /// Seconds
    #[serde(default)]
    pub timeout: i64,
}

/// Release stage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseConfig {
    /// Defaults to the platform domain
    #[serde(default)]
    pub domain: String,

    /// Primary hostname; the primary route is skipped when empty
    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub additional_routes: Vec<String>,

    /// Stop applications that lost their routes to the new release
    #[serde(default)]
    pub stop_old_instances: bool,
}
