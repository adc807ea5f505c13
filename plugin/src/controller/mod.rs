//! Controller client capability
//!
//! Every remote operation returns its value together with the advisory
//! warnings the controller attached to the response. The traits are split
//! by resource; [`Controller`] is implemented for anything that provides
//! all of them (the HTTP client, or an in-memory fake in tests).

use async_trait::async_trait;
use cf_api::{
    Application, Build, CreateAppRequest, CreatePackageRequest, CreateRouteRequest,
    CreateServiceBindingRequest, Domain, EnvironmentVariables, Organization, Package, Process,
    ProcessInstance, Route, ScaleProcessRequest, ServiceInstance, Space, UpdateProcessRequest,
};

use crate::errors::PluginError;

pub mod warnings;

pub use warnings::WarningLogger;

/// A successful result plus the warnings that came with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warned<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Warned<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<String>) -> Self {
        Self { value, warnings }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Warned<U> {
        Warned {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

pub type ApiResult<T> = Result<Warned<T>, PluginError>;

/// Organisations, spaces and domains
#[async_trait]
pub trait TenancyApi: Send + Sync {
    async fn find_organizations(&self, name: &str) -> ApiResult<Vec<Organization>>;

    async fn find_spaces(&self, organization_guid: &str, name: &str) -> ApiResult<Vec<Space>>;

    async fn find_domains(&self, name: &str) -> ApiResult<Vec<Domain>>;
}

#[async_trait]
pub trait AppsApi: Send + Sync {
    async fn find_applications(
        &self,
        organization_guid: &str,
        space_guid: &str,
        name: &str,
    ) -> ApiResult<Vec<Application>>;

    async fn create_application(&self, request: &CreateAppRequest) -> ApiResult<Application>;

    async fn delete_application(&self, guid: &str) -> ApiResult<()>;

    async fn stop_application(&self, guid: &str) -> ApiResult<Application>;

    async fn update_environment_variables(
        &self,
        app_guid: &str,
        vars: &EnvironmentVariables,
    ) -> ApiResult<EnvironmentVariables>;

    async fn application_routes(&self, app_guid: &str) -> ApiResult<Vec<Route>>;
}

#[async_trait]
pub trait ProcessesApi: Send + Sync {
    async fn application_processes(&self, app_guid: &str) -> ApiResult<Vec<Process>>;

    async fn process_instances(&self, process_guid: &str) -> ApiResult<Vec<ProcessInstance>>;

    async fn scale_process(
        &self,
        app_guid: &str,
        process_type: &str,
        request: &ScaleProcessRequest,
    ) -> ApiResult<Process>;

    async fn update_process(
        &self,
        process_guid: &str,
        request: &UpdateProcessRequest,
    ) -> ApiResult<Process>;
}

/// Packages, builds and deployments
#[async_trait]
pub trait StagingApi: Send + Sync {
    async fn create_package(&self, request: &CreatePackageRequest) -> ApiResult<Package>;

    async fn create_build(&self, package_guid: &str) -> ApiResult<Build>;

    async fn get_build(&self, guid: &str) -> ApiResult<Build>;

    async fn create_deployment(
        &self,
        app_guid: &str,
        droplet_guid: &str,
    ) -> ApiResult<cf_api::Deployment>;
}

#[async_trait]
pub trait RoutesApi: Send + Sync {
    async fn find_routes(&self, domain_guid: &str, host: &str) -> ApiResult<Vec<Route>>;

    async fn get_route(&self, guid: &str) -> ApiResult<Route>;

    async fn create_route(&self, request: &CreateRouteRequest) -> ApiResult<Route>;

    /// Adds the app as a destination; mapping an already mapped app is a no-op
    async fn map_route(&self, route_guid: &str, app_guid: &str) -> ApiResult<()>;

    async fn unmap_route(&self, route_guid: &str, destination_guid: &str) -> ApiResult<()>;

    async fn delete_route(&self, guid: &str) -> ApiResult<()>;
}

#[async_trait]
pub trait ServicesApi: Send + Sync {
    async fn find_service_instances(
        &self,
        space_guid: &str,
        name: &str,
    ) -> ApiResult<Vec<ServiceInstance>>;

    async fn create_service_binding(&self, request: &CreateServiceBindingRequest) -> ApiResult<()>;
}

/// The full capability set the plugin needs from the controller
pub trait Controller:
    TenancyApi + AppsApi + ProcessesApi + StagingApi + RoutesApi + ServicesApi
{
}

impl<T> Controller for T where
    T: TenancyApi + AppsApi + ProcessesApi + StagingApi + RoutesApi + ServicesApi
{
}
