//! Controller connection target
//!
//! Resolved from `CF_API_URL` / `CF_ACCESS_TOKEN`, falling back to the cf CLI
//! config file (`$CF_HOME/.cf/config.json`, `$HOME/.cf/config.json`).
//! Tokens are used as-is; refreshing them is the cf CLI's job.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::errors::PluginError;
use crate::filesys::file::File;

pub const API_URL_ENV: &str = "CF_API_URL";
pub const ACCESS_TOKEN_ENV: &str = "CF_ACCESS_TOKEN";
pub const SKIP_SSL_ENV: &str = "CF_SKIP_SSL_VALIDATION";

/// Where and how to reach the Cloud Controller
#[derive(Debug, Clone)]
pub struct ControllerTarget {
    pub api_url: Url,
    pub token: SecretString,
    pub skip_ssl_validation: bool,
}

/// Subset of the cf CLI `config.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CfCliConfig {
    #[serde(default)]
    target: String,
    #[serde(default)]
    access_token: String,
    #[serde(default, rename = "SkipSSLValidation")]
    skip_ssl_validation: bool,
}

impl ControllerTarget {
    /// Resolve the target from the process environment
    pub async fn from_env() -> Result<Self, PluginError> {
        Self::resolve(|key| std::env::var(key).ok()).await
    }

    pub async fn resolve<F>(lookup: F) -> Result<Self, PluginError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let skip_ssl = lookup(SKIP_SSL_ENV)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        if let (Some(api_url), Some(token)) = (lookup(API_URL_ENV), lookup(ACCESS_TOKEN_ENV)) {
            debug!("Using controller target from environment");
            return Self::build(&api_url, &token, skip_ssl);
        }

        let path = cf_config_path(&lookup).ok_or_else(|| {
            PluginError::ConfigError(format!(
                "no controller target: set {} and {} or log in with the cf CLI",
                API_URL_ENV, ACCESS_TOKEN_ENV
            ))
        })?;
        debug!("Using controller target from {}", path.display());

        let config: CfCliConfig = File::new(path).read_json().await?;
        Self::build(
            &config.target,
            &config.access_token,
            skip_ssl || config.skip_ssl_validation,
        )
    }

    fn build(api_url: &str, token: &str, skip_ssl_validation: bool) -> Result<Self, PluginError> {
        if api_url.is_empty() {
            return Err(PluginError::ConfigError("controller API URL is empty".to_string()));
        }
        let api_url = Url::parse(api_url)
            .map_err(|e| PluginError::ConfigError(format!("invalid controller URL {}: {}", api_url, e)))?;

        let token = strip_bearer(token);
        if token.is_empty() {
            return Err(PluginError::ConfigError(
                "no access token available, run `cf login` first".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            token: SecretString::from(token.to_string()),
            skip_ssl_validation,
        })
    }
}

fn cf_config_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("CF_HOME")
        .or_else(|| lookup("HOME"))
        .map(|home| PathBuf::from(home).join(".cf").join("config.json"))
}

fn strip_bearer(token: &str) -> &str {
    let token = token.trim();
    match token.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => token,
    }
}
