//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Short random identifier for a deployment: the first 8 characters of a UUID v4
pub fn generate_short_id() -> String {
    let mut id = uuid::Uuid::new_v4().to_string();
    id.truncate(8);
    id
}

/// `"<app>-<id>"`, the name shared by the deployed app and its default route
pub fn deployment_name(app_name: &str, id: &str) -> String {
    format!("{}-{}", app_name, id)
}
