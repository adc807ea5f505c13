//! Warning-logging façade over a [`Controller`]
//!
//! Orchestration code talks to this wrapper, which strips the advisory
//! warnings off each response and records them in the log.

use std::sync::Arc;

use cf_api::{
    Application, Build, CreateAppRequest, CreatePackageRequest, CreateRouteRequest,
    CreateServiceBindingRequest, Domain, EnvironmentVariables, Organization, Package, Process,
    ProcessInstance, Route, ScaleProcessRequest, ServiceInstance, Space, UpdateProcessRequest,
};
use tracing::warn;

use crate::controller::{ApiResult, Controller};
use crate::errors::PluginError;

pub struct WarningLogger<C> {
    inner: Arc<C>,
}

impl<C> Clone for WarningLogger<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Controller> WarningLogger<C> {
    pub fn new(inner: Arc<C>) -> Self {
        Self { inner }
    }

    fn settle<T>(&self, operation: &str, result: ApiResult<T>) -> Result<T, PluginError> {
        let warned = result?;
        for warning in &warned.warnings {
            warn!(operation, "Cloud Foundry warning: {}", warning);
        }
        Ok(warned.value)
    }

    pub async fn find_organizations(&self, name: &str) -> Result<Vec<Organization>, PluginError> {
        self.settle("find organizations", self.inner.find_organizations(name).await)
    }

    pub async fn find_spaces(
        &self,
        organization_guid: &str,
        name: &str,
    ) -> Result<Vec<Space>, PluginError> {
        self.settle(
            "find spaces",
            self.inner.find_spaces(organization_guid, name).await,
        )
    }

    pub async fn find_domains(&self, name: &str) -> Result<Vec<Domain>, PluginError> {
        self.settle("find domains", self.inner.find_domains(name).await)
    }

    pub async fn find_applications(
        &self,
        organization_guid: &str,
        space_guid: &str,
        name: &str,
    ) -> Result<Vec<Application>, PluginError> {
        self.settle(
            "find applications",
            self.inner
                .find_applications(organization_guid, space_guid, name)
                .await,
        )
    }

    pub async fn create_application(
        &self,
        request: &CreateAppRequest,
    ) -> Result<Application, PluginError> {
        self.settle("create application", self.inner.create_application(request).await)
    }

    pub async fn delete_application(&self, guid: &str) -> Result<(), PluginError> {
        self.settle("delete application", self.inner.delete_application(guid).await)
    }

    pub async fn stop_application(&self, guid: &str) -> Result<Application, PluginError> {
        self.settle("stop application", self.inner.stop_application(guid).await)
    }

    pub async fn update_environment_variables(
        &self,
        app_guid: &str,
        vars: &EnvironmentVariables,
    ) -> Result<EnvironmentVariables, PluginError> {
        self.settle(
            "update environment variables",
            self.inner.update_environment_variables(app_guid, vars).await,
        )
    }

    pub async fn application_routes(&self, app_guid: &str) -> Result<Vec<Route>, PluginError> {
        self.settle("list application routes", self.inner.application_routes(app_guid).await)
    }

    pub async fn application_processes(&self, app_guid: &str) -> Result<Vec<Process>, PluginError> {
        self.settle(
            "list application processes",
            self.inner.application_processes(app_guid).await,
        )
    }

    pub async fn process_instances(
        &self,
        process_guid: &str,
    ) -> Result<Vec<ProcessInstance>, PluginError> {
        self.settle(
            "list process instances",
            self.inner.process_instances(process_guid).await,
        )
    }

    pub async fn scale_process(
        &self,
        app_guid: &str,
        process_type: &str,
        request: &ScaleProcessRequest,
    ) -> Result<Process, PluginError> {
        self.settle(
            "scale process",
            self.inner.scale_process(app_guid, process_type, request).await,
        )
    }

    pub async fn update_process(
        &self,
        process_guid: &str,
        request: &UpdateProcessRequest,
    ) -> Result<Process, PluginError> {
        self.settle("update process", self.inner.update_process(process_guid, request).await)
    }

    pub async fn create_package(&self, request: &CreatePackageRequest) -> Result<Package, PluginError> {
        self.settle("create package", self.inner.create_package(request).await)
    }

    pub async fn create_build(&self, package_guid: &str) -> Result<Build, PluginError> {
        self.settle("create build", self.inner.create_build(package_guid).await)
    }

    pub async fn get_build(&self, guid: &str) -> Result<Build, PluginError> {
        self.settle("get build", self.inner.get_build(guid).await)
    }

    pub async fn create_deployment(
        &self,
        app_guid: &str,
        droplet_guid: &str,
    ) -> Result<cf_api::Deployment, PluginError> {
        self.settle(
            "create deployment",
            self.inner.create_deployment(app_guid, droplet_guid).await,
        )
    }

    pub async fn find_routes(&self, domain_guid: &str, host: &str) -> Result<Vec<Route>, PluginError> {
        self.settle("find routes", self.inner.find_routes(domain_guid, host).await)
    }

    pub async fn get_route(&self, guid: &str) -> Result<Route, PluginError> {
        self.settle("get route", self.inner.get_route(guid).await)
    }

    pub async fn create_route(&self, request: &CreateRouteRequest) -> Result<Route, PluginError> {
        self.settle("create route", self.inner.create_route(request).await)
    }

    pub async fn map_route(&self, route_guid: &str, app_guid: &str) -> Result<(), PluginError> {
        self.settle("map route", self.inner.map_route(route_guid, app_guid).await)
    }

    pub async fn unmap_route(
        &self,
        route_guid: &str,
        destination_guid: &str,
    ) -> Result<(), PluginError> {
        self.settle(
            "unmap route",
            self.inner.unmap_route(route_guid, destination_guid).await,
        )
    }

    pub async fn delete_route(&self, guid: &str) -> Result<(), PluginError> {
        self.settle("delete route", self.inner.delete_route(guid).await)
    }

    pub async fn find_service_instances(
        &self,
        space_guid: &str,
        name: &str,
    ) -> Result<Vec<ServiceInstance>, PluginError> {
        self.settle(
            "find service instances",
            self.inner.find_service_instances(space_guid, name).await,
        )
    }

    pub async fn create_service_binding(
        &self,
        request: &CreateServiceBindingRequest,
    ) -> Result<(), PluginError> {
        self.settle(
            "create service binding",
            self.inner.create_service_binding(request).await,
        )
    }
}
