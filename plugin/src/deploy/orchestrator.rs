//! Deploy pipeline
//!
//! Runs every phase once, in order, stopping at the first error. Once the
//! application exists, any later failure deletes it again.

use std::sync::Arc;
use std::time::Duration;

use cf_api::{
    AppRelationships, Application, BindingRelationships, Build, CreateAppRequest,
    CreatePackageRequest, CreateServiceBindingRequest, DockerData, Lifecycle, Metadata, Package,
    PackageRelationships, Route, ToOne,
};
use secrecy::ExposeSecret;
use tracing::{debug, error, info};

use crate::config::settings::{PlatformConfig, DOCKER_PASSWORD_ENV};
use crate::controller::{Controller, WarningLogger};
use crate::deploy::env::merge_env;
use crate::deploy::fsm::{DeployFsm, DeployPhase, DeploySettings};
use crate::deploy::params::{resolve_timeout, HealthCheckParams, QuotaParams};
use crate::deploy::wait::{wait_for_build, wait_for_processes};
use crate::errors::{PluginError, ResultExt};
use crate::models::{Deployment, ImageRef};
use crate::release::routes::RouteReconciler;
use crate::terminal::{run_step, Steps};
use crate::utils::{deployment_name, generate_short_id};

/// Label carrying the source application name, for provenance searches
pub const APP_NAME_LABEL: &str = "appName";

/// Process type quota is applied to
pub const WEB_PROCESS: &str = "web";

/// What to deploy
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// Source application name, the prefix of the deployment name
    pub app_name: String,

    pub image: ImageRef,
}

/// Validated inputs
#[derive(Debug)]
struct Parameters {
    quota: QuotaParams,
    health_check: HealthCheckParams,
    deployment_timeout: Duration,
    staging_timeout: Duration,
}

/// Per-deploy accumulator
#[derive(Debug)]
struct DeploymentState {
    deployment: Deployment,
    app_name: String,
    image: ImageRef,
    quota: QuotaParams,
    health_check: HealthCheckParams,
    deployment_timeout: Duration,
    staging_timeout: Duration,
    existing_apps: Vec<Application>,
    app: Option<Application>,
    fsm: DeployFsm,
}

/// Deploy orchestrator
pub struct Orchestrator<C> {
    cf: WarningLogger<C>,
    config: PlatformConfig,
    settings: DeploySettings,
    steps: Arc<dyn Steps>,
}

impl<C: Controller> Orchestrator<C> {
    pub fn new(
        cf: WarningLogger<C>,
        config: PlatformConfig,
        settings: DeploySettings,
        steps: Arc<dyn Steps>,
    ) -> Self {
        Self {
            cf,
            config,
            settings,
            steps,
        }
    }

    /// Deploy `request.image` as a fresh application
    pub async fn deploy(&self, request: &DeployRequest) -> Result<Deployment, PluginError> {
        let mut state = self.validate(request)?;
        info!(
            deployment = %state.deployment.name,
            image = %state.image,
            "Deploying"
        );

        match self.provision(&mut state).await {
            Ok(()) => {
                info!(
                    deployment = %state.deployment.name,
                    url = %state.deployment.url,
                    "Deployment finished"
                );
                Ok(state.deployment)
            }
            Err(e) => {
                state.fsm.fail();
                let phase = state.fsm.failed_in().unwrap_or(DeployPhase::Pending);
                error!(deployment = %state.deployment.name, %phase, "Deploy failed: {}", e);
                if state.fsm.should_cleanup() {
                    self.cleanup(&state).await;
                }
                Err(e)
            }
        }
    }

    /// Parameter validation; nothing remote happens before this passes
    fn validate(&self, request: &DeployRequest) -> Result<DeploymentState, PluginError> {
        let step = self.steps.add("Validating deployment parameters");
        let params = match self.resolve_parameters() {
            Ok(params) => {
                step.done();
                params
            }
            Err(e) => {
                step.abort();
                return Err(e);
            }
        };

        let id = generate_short_id();
        let name = deployment_name(&request.app_name, &id);
        debug!(deployment = %name, app = %request.app_name, "Generated deployment name");

        Ok(DeploymentState {
            deployment: Deployment {
                id,
                name,
                ..Deployment::default()
            },
            app_name: request.app_name.clone(),
            image: request.image.clone(),
            quota: params.quota,
            health_check: params.health_check,
            deployment_timeout: params.deployment_timeout,
            staging_timeout: params.staging_timeout,
            existing_apps: Vec::new(),
            app: None,
            fsm: DeployFsm::new(),
        })
    }

    fn resolve_parameters(&self) -> Result<Parameters, PluginError> {
        Ok(Parameters {
            quota: QuotaParams::resolve(self.config.quota.as_ref())?,
            health_check: HealthCheckParams::resolve(self.config.health_check.as_ref())?,
            deployment_timeout: resolve_timeout(
                &self.config.deployment_timeout,
                self.settings.deployment_timeout,
                "deployment timeout",
            )?,
            staging_timeout: resolve_timeout(
                &self.config.staging_timeout,
                self.settings.staging_timeout,
                "staging timeout",
            )?,
        })
    }

    async fn provision(&self, state: &mut DeploymentState) -> Result<(), PluginError> {
        self.resolve_tenancy(state).await?;
        self.replace_existing(state).await?;
        let app = self.create_app(state).await?;
        self.apply_quota(state, &app).await?;
        let package = self.create_package(state).await?;
        self.set_environment(state, &app).await?;
        self.bind_services(state, &app).await?;
        let build = self.stage(state, &package).await?;
        self.create_deployment(state, &build).await?;
        self.await_convergence(state).await?;
        self.configure_health_check(state).await?;
        let route = self.bind_route(state).await?;

        state.fsm.succeed()?;
        state.deployment.url = route.url;
        Ok(())
    }

    async fn resolve_tenancy(&self, state: &mut DeploymentState) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::ResolvingTenancy)?;

        let description = format!(
            "Selecting organisation {} and space {}",
            self.config.organisation, self.config.space
        );
        let (organisation_guid, space_guid) = run_step(self.steps.as_ref(), &description, async {
            let org = self
                .cf
                .find_organizations(&self.config.organisation)
                .await
                .and_then(|orgs| exactly_one(orgs, "organisation", &self.config.organisation))
                .context("failed to select organisation")?;

            let space = self
                .cf
                .find_spaces(&org.guid, &self.config.space)
                .await
                .and_then(|spaces| exactly_one(spaces, "space", &self.config.space))
                .context("failed to select space")?;

            Ok((org.guid, space.guid))
        })
        .await?;

        state.deployment.organisation_guid = organisation_guid;
        state.deployment.space_guid = space_guid;
        Ok(())
    }

    async fn replace_existing(&self, state: &mut DeploymentState) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::ReplacingExisting)?;
        let name = state.deployment.name.clone();

        let mut step = self.steps.add(&format!("Searching app: {}", name));
        let apps = match self
            .cf
            .find_applications(
                &state.deployment.organisation_guid,
                &state.deployment.space_guid,
                &name,
            )
            .await
        {
            Ok(apps) => apps,
            Err(e) => {
                step.abort();
                return Err(e.context("failed to search for app"));
            }
        };
        let found = if apps.is_empty() { "not found" } else { "found" };
        step.update(&format!("Searching app: {} [{}]", name, found));
        step.done();
        state.existing_apps = apps;

        if let Some(existing) = state.existing_apps.first() {
            let description = format!("Deleting existing app {} (will be recreated)", name);
            run_step(self.steps.as_ref(), &description, async {
                self.cf
                    .delete_application(&existing.guid)
                    .await
                    .context("failed to delete app")
            })
            .await?;
        }
        Ok(())
    }

    async fn create_app(&self, state: &mut DeploymentState) -> Result<Application, PluginError> {
        state.fsm.enter(DeployPhase::CreatingApp)?;

        let request = CreateAppRequest {
            name: state.deployment.name.clone(),
            relationships: AppRelationships {
                space: ToOne::to(state.deployment.space_guid.as_str()),
            },
            lifecycle: Lifecycle::docker(),
            metadata: Some(Metadata {
                labels: [(APP_NAME_LABEL.to_string(), state.app_name.clone())].into_iter().collect(),
                ..Metadata::default()
            }),
        };

        let description = format!("Creating app {}", state.deployment.name);
        let app = run_step(self.steps.as_ref(), &description, async {
            self.cf
                .create_application(&request)
                .await
                .context("failed to create app")
        })
        .await?;

        state.fsm.app_created();
        state.deployment.app_guid = app.guid.clone();
        state.app = Some(app.clone());
        Ok(app)
    }

    async fn apply_quota(&self, state: &mut DeploymentState, app: &Application) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::ApplyingQuota)?;
        if !state.quota.needs_update() {
            return Ok(());
        }

        let request = state.quota.scale_request();
        run_step(self.steps.as_ref(), "Configuring quota", async {
            let processes = self
                .cf
                .application_processes(&app.guid)
                .await
                .context("failed to get application processes")?;
            if processes.is_empty() {
                return Err(PluginError::NotFound("no processes found".to_string()));
            }

            self.cf
                .scale_process(&app.guid, WEB_PROCESS, &request)
                .await
                .context("unable to scale application")?;
            Ok(())
        })
        .await
    }

    async fn create_package(&self, state: &mut DeploymentState) -> Result<Package, PluginError> {
        state.fsm.enter(DeployPhase::CreatingPackage)?;

        let description = format!("Creating new package for docker image {}", state.image);
        let request = CreatePackageRequest {
            kind: "docker".to_string(),
            data: self.docker_data(&state.image),
            relationships: PackageRelationships {
                app: ToOne::to(state.deployment.app_guid.as_str()),
            },
        };

        let package = run_step(self.steps.as_ref(), &description, async {
            if request.data.username.is_some() && request.data.password.is_none() {
                return Err(PluginError::Validation(format!(
                    "invalid docker credentials: password is empty, set {}",
                    DOCKER_PASSWORD_ENV
                )));
            }
            self.cf.create_package(&request).await
        })
        .await
        .context("failed to create package")?;

        Ok(package)
    }

    fn docker_data(&self, image: &ImageRef) -> DockerData {
        let mut data = DockerData {
            image: image.reference(),
            ..DockerData::default()
        };
        if let Some(docker) = &self.config.docker {
            data.username = Some(docker.username.clone());
            data.password = docker
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string())
                .filter(|p| !p.is_empty());
        }
        data
    }

    async fn set_environment(&self, state: &mut DeploymentState, app: &Application) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::SettingEnvironment)?;
        if self.config.env.is_empty() && self.config.env_from_file.is_empty() {
            return Ok(());
        }

        let vars = merge_env(&self.config.env_from_file, &self.config.env);
        debug!(count = vars.var.len(), "Setting environment variables");
        run_step(self.steps.as_ref(), "Assigning environment variables", async {
            self.cf
                .update_environment_variables(&app.guid, &vars)
                .await
                .context("unable to set environment variables")?;
            Ok(())
        })
        .await
    }

    async fn bind_services(&self, state: &mut DeploymentState, app: &Application) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::BindingServices)?;
        if self.config.service_bindings.is_empty() {
            return Ok(());
        }

        let space_guid = state.deployment.space_guid.clone();
        run_step(self.steps.as_ref(), "Binding services", async {
            for service_name in &self.config.service_bindings {
                let instances = self
                    .cf
                    .find_service_instances(&space_guid, service_name)
                    .await
                    .context(format!("unable to get service {}", service_name))?;
                let instance = exactly_one(instances, "service instance", service_name)
                    .context(format!("unable to get service {}", service_name))?;

                debug!(service = %service_name, instance = %instance.guid, app = %app.guid, "Binding service");
                let request = CreateServiceBindingRequest {
                    kind: "app".to_string(),
                    relationships: BindingRelationships {
                        service_instance: ToOne::to(instance.guid.as_str()),
                        app: ToOne::to(app.guid.as_str()),
                    },
                    parameters: serde_json::Map::new(),
                };
                self.cf
                    .create_service_binding(&request)
                    .await
                    .context(format!("unable to bind service {} to app", service_name))?;
            }
            Ok(())
        })
        .await
    }

    async fn stage(&self, state: &mut DeploymentState, package: &Package) -> Result<Build, PluginError> {
        state.fsm.enter(DeployPhase::Staging)?;

        let description = format!(
            "Creating a new build for the created package of image {}",
            state.image
        );
        let mut step = self.steps.add(&description);

        let result = async {
            let build = self
                .cf
                .create_build(&package.guid)
                .await
                .context("failed to create build")?;
            debug!(build = %build.guid, "Build created");

            wait_for_build(
                &self.cf,
                &mut *step,
                &description,
                build,
                self.settings.build_poll_interval,
                state.staging_timeout,
            )
            .await
        }
        .await;

        match result {
            Ok(build) => {
                step.done();
                Ok(build)
            }
            Err(e) => {
                step.abort();
                Err(e)
            }
        }
    }

    async fn create_deployment(&self, state: &mut DeploymentState, build: &Build) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::CreatingDeployment)?;

        let app_guid = state.deployment.app_guid.clone();
        run_step(self.steps.as_ref(), "Creating a new deployment", async {
            let droplet = build.droplet.as_ref().ok_or_else(|| {
                PluginError::Internal(format!("build {} has no droplet", build.guid))
            })?;
            let created = self.cf.create_deployment(&app_guid, &droplet.guid).await?;
            debug!(deployment = %created.guid, "Platform deployment created");
            Ok(())
        })
        .await
        .context("failed to create deployment")
    }

    async fn await_convergence(&self, state: &mut DeploymentState) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::WaitingForProcesses)?;

        run_step(
            self.steps.as_ref(),
            "Waiting for the application to start",
            wait_for_processes(
                &self.cf,
                &state.deployment.name,
                &state.deployment.app_guid,
                self.settings.process_poll_interval,
                state.deployment_timeout,
            ),
        )
        .await
    }

    async fn configure_health_check(&self, state: &mut DeploymentState) -> Result<(), PluginError> {
        state.fsm.enter(DeployPhase::ConfiguringHealthCheck)?;
        if !state.health_check.needs_update() {
            return Ok(());
        }

        let params = &state.health_check;
        let app_guid = &state.deployment.app_guid;
        run_step(self.steps.as_ref(), "Configuring health check", async {
            let processes = self
                .cf
                .application_processes(app_guid)
                .await
                .context("failed to get application processes")?;
            if processes.is_empty() {
                return Err(PluginError::NotFound("no processes found".to_string()));
            }

            for process in &processes {
                let request = params.update_request(process);
                debug!(process = %process.guid, health_check = ?request.health_check, "Updating process");
                self.cf
                    .update_process(&process.guid, &request)
                    .await
                    .context("unable to configure application process")?;
            }
            Ok(())
        })
        .await
    }

    async fn bind_route(&self, state: &mut DeploymentState) -> Result<Route, PluginError> {
        state.fsm.enter(DeployPhase::BindingRoute)?;

        let deployment = &state.deployment;
        let description = format!(
            "Binding route {}.{} to application",
            deployment.name, self.config.domain
        );
        let reconciler = RouteReconciler::new(&self.cf);
        let reconciled = run_step(self.steps.as_ref(), &description, async {
            let domain = reconciler.domain(&self.config.domain).await?;
            reconciler
                .reconcile(
                    &deployment.name,
                    &domain,
                    &deployment.space_guid,
                    &deployment.app_guid,
                )
                .await
        })
        .await?;

        Ok(reconciled.route)
    }

    /// Delete the created application; failures are logged only
    async fn cleanup(&self, state: &DeploymentState) {
        let Some(app) = &state.app else {
            return;
        };
        let app_guid = &app.guid;
        info!(app_guid = %app_guid, "Cleaning up application after failed deploy");

        let step = self.steps.add(&format!("Deleting app {}", state.deployment.name));
        match self.cf.delete_application(app_guid).await {
            Ok(()) => step.done(),
            Err(e) => {
                step.abort();
                error!(app_guid = %app_guid, "Unable to delete application: {}", e);
            }
        }
    }
}

/// The single element of `items`, or `NotFound` / `Ambiguous`
pub(crate) fn exactly_one<T>(items: Vec<T>, kind: &str, name: &str) -> Result<T, PluginError> {
    let count = items.len();
    let mut items = items.into_iter();
    match (items.next(), count) {
        (Some(item), 1) => Ok(item),
        (None, _) => Err(PluginError::NotFound(format!("{} {}", kind, name))),
        _ => Err(PluginError::Ambiguous(format!(
            "found {} {}s with the name {}",
            count, kind, name
        ))),
    }
}
