//! API models

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bare `{ "guid": ... }` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuidRef {
    pub guid: String,
}

impl GuidRef {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

/// To-one relationship: `{ "data": { "guid": ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToOne {
    pub data: Option<GuidRef>,
}

impl ToOne {
    pub fn to(guid: impl Into<String>) -> Self {
        Self {
            data: Some(GuidRef::new(guid)),
        }
    }

    pub fn guid(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.guid.as_str())
    }
}

/// Paginated list envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    pub resources: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub next: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Error envelope returned on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.code, self.detail)
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Labels and annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

// ================================ TENANCY ================================== //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub guid: String,
    pub name: String,
}

// ================================= APPS ==================================== //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
    Started,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Lifecycle {
    pub fn docker() -> Self {
        Self {
            kind: "docker".to_string(),
            data: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub guid: String,
    pub name: String,
    pub state: AppState,
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppRelationships {
    pub space: ToOne,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAppRequest {
    pub name: String,
    pub relationships: AppRelationships,
    pub lifecycle: Lifecycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// `PATCH /v3/apps/:guid/environment_variables`; `None` unsets the variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariables {
    pub var: BTreeMap<String, Option<String>>,
}

// =============================== PROCESSES ================================= //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: HealthCheckData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub guid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub instances: u32,
    #[serde(default)]
    pub memory_in_mb: u64,
    #[serde(default)]
    pub disk_in_mb: u64,
    #[serde(default)]
    pub health_check: Option<HealthCheck>,
}

/// `POST /v3/apps/:guid/processes/:type/actions/scale`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScaleProcessRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_in_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_in_mb: Option<u64>,
}

/// `PATCH /v3/processes/:guid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateProcessRequest {
    pub health_check: HealthCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Running,
    Crashed,
    Starting,
    Down,
    /// Any other state, as reported
    Other(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        match self {
            InstanceState::Running => "RUNNING",
            InstanceState::Crashed => "CRASHED",
            InstanceState::Starting => "STARTING",
            InstanceState::Down => "DOWN",
            InstanceState::Other(state) => state,
        }
    }
}

impl From<String> for InstanceState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "RUNNING" => InstanceState::Running,
            "CRASHED" => InstanceState::Crashed,
            "STARTING" => InstanceState::Starting,
            "DOWN" => InstanceState::Down,
            _ => InstanceState::Other(state),
        }
    }
}

impl From<InstanceState> for String {
    fn from(state: InstanceState) -> Self {
        match state {
            InstanceState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `GET /v3/processes/:guid/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInstance {
    #[serde(default)]
    pub index: u32,
    pub state: InstanceState,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub details: Option<String>,
}

// ================================ STAGING ================================== //

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerData {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub guid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: DockerData,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageRelationships {
    pub app: ToOne,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePackageRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: DockerData,
    pub relationships: PackageRelationships,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildState {
    Staging,
    Staged,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub guid: String,
    pub state: BuildState,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub droplet: Option<GuidRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Build {
    /// Staging error reported by the controller, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBuildRequest {
    pub package: GuidRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub guid: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentRelationships {
    pub app: ToOne,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDeploymentRequest {
    pub droplet: GuidRef,
    pub relationships: DeploymentRelationships,
}

// ================================= ROUTES ================================== //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationApp {
    pub guid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDestination {
    pub guid: String,
    pub app: DestinationApp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub guid: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub url: String,
    #[serde(default)]
    pub destinations: Vec<RouteDestination>,
}

fn default_protocol() -> String {
    "http".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteRelationships {
    pub space: ToOne,
    pub domain: ToOne,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRouteRequest {
    pub host: String,
    pub relationships: RouteRelationships,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDestination {
    pub app: GuidRef,
}

/// `POST /v3/routes/:guid/destinations`
#[derive(Debug, Clone, Serialize)]
pub struct InsertDestinationsRequest {
    pub destinations: Vec<NewDestination>,
}

// =============================== SERVICES ================================== //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BindingRelationships {
    pub service_instance: ToOne,
    pub app: ToOne,
}

/// `POST /v3/service_credential_bindings`
#[derive(Debug, Clone, Serialize)]
pub struct CreateServiceBindingRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub relationships: BindingRelationships,
    pub parameters: serde_json::Map<String, serde_json::Value>,
}
