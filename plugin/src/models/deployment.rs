//! Deployment and release records
//!
//! Both are persisted by the host between pipeline stages.

use serde::{Deserialize, Serialize};

/// One deployed application instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Short random id, generated once per deploy
    pub id: String,

    /// `"<app>-<id>"`, also the default route hostname
    pub name: String,

    pub organisation_guid: String,

    pub space_guid: String,

    pub app_guid: String,

    /// Set once the deployment route is bound
    #[serde(default)]
    pub url: String,
}

/// Result of the release stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub url: String,

    /// Needed by the release status check
    #[serde(default)]
    pub route_guid: String,
}
