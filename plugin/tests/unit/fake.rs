//! In-memory Cloud Controller used by the stage tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use cf_api::{
    AppState, Application, Build, BuildState, CreateAppRequest, CreatePackageRequest,
    CreateRouteRequest, CreateServiceBindingRequest, DestinationApp, Domain, EnvironmentVariables,
    GuidRef, Organization, Package, Process, ProcessInstance, InstanceState, Route,
    RouteDestination, ScaleProcessRequest, ServiceInstance, Space, UpdateProcessRequest,
};
use cfdeploy::controller::{
    ApiResult, AppsApi, ProcessesApi, RoutesApi, ServicesApi, StagingApi, TenancyApi, Warned,
    WarningLogger,
};
use cfdeploy::errors::PluginError;

pub const ORG: &str = "acme";
pub const SPACE: &str = "prod";
pub const DOMAIN: &str = "apps.example.com";
pub const SPACE_GUID: &str = "space-1";
pub const ORG_GUID: &str = "org-1";
pub const DOMAIN_GUID: &str = "domain-1";

#[derive(Default)]
pub struct FakeState {
    pub orgs: Vec<Organization>,
    pub spaces: Vec<Space>,
    pub domains: Vec<Domain>,
    pub apps: Vec<Application>,
    pub processes: HashMap<String, Vec<Process>>,
    pub instances: HashMap<String, Vec<ProcessInstance>>,
    /// (domain guid, route)
    pub routes: Vec<(String, Route)>,
    pub services: Vec<ServiceInstance>,

    /// Instance states given to the web process of newly created apps
    pub new_app_instances: Vec<InstanceState>,
    /// Polled builds report FAILED instead of STAGED
    pub build_fails: bool,
    /// Polled builds stay STAGING
    pub build_stuck: bool,
    pub build_error: Option<String>,
    pub failing: HashSet<&'static str>,
    /// App guids returned by every application search, whatever the name
    pub search_hits: Vec<String>,
    pub warnings: Vec<String>,

    pub calls: Vec<&'static str>,
    pub created_apps: Vec<CreateAppRequest>,
    pub deleted_apps: Vec<String>,
    pub stopped_apps: Vec<String>,
    pub deleted_routes: Vec<String>,
    pub scale_requests: Vec<ScaleProcessRequest>,
    pub process_updates: Vec<UpdateProcessRequest>,
    pub env_updates: Vec<EnvironmentVariables>,
    pub bindings: Vec<CreateServiceBindingRequest>,
    pub packages: Vec<CreatePackageRequest>,

    next_id: u32,
}

impl FakeState {
    fn next_guid(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

pub struct FakeController {
    state: Mutex<FakeState>,
}

impl FakeController {
    /// One organisation, one space and one domain
    pub fn new() -> Arc<Self> {
        let state = FakeState {
            orgs: vec![Organization {
                guid: ORG_GUID.to_string(),
                name: ORG.to_string(),
            }],
            spaces: vec![Space {
                guid: SPACE_GUID.to_string(),
                name: SPACE.to_string(),
            }],
            domains: vec![Domain {
                guid: DOMAIN_GUID.to_string(),
                name: DOMAIN.to_string(),
            }],
            new_app_instances: vec![InstanceState::Running],
            ..FakeState::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn logger(self: &Arc<Self>) -> WarningLogger<FakeController> {
        WarningLogger::new(self.clone())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    /// Existing application with one web process in the given states
    pub fn add_app(&self, name: &str, states: &[InstanceState]) -> String {
        let mut state = self.state();
        let guid = state.next_guid("app");
        state.apps.push(Application {
            guid: guid.clone(),
            name: name.to_string(),
            state: AppState::Started,
            lifecycle: None,
            metadata: None,
            created_at: None,
        });
        add_web_process(&mut state, &guid, states);
        guid
    }

    /// Existing route on the default domain mapped to `app_guids`
    pub fn add_route(&self, host: &str, app_guids: &[&str]) -> String {
        let mut state = self.state();
        let guid = state.next_guid("route");
        let destinations = app_guids
            .iter()
            .map(|app| RouteDestination {
                guid: state.next_guid("dest"),
                app: DestinationApp {
                    guid: app.to_string(),
                },
            })
            .collect();
        state.routes.push((
            DOMAIN_GUID.to_string(),
            Route {
                guid: guid.clone(),
                host: host.to_string(),
                path: String::new(),
                protocol: "http".to_string(),
                url: format!("{}.{}", host, DOMAIN),
                destinations,
            },
        ));
        guid
    }

    pub fn route(&self, guid: &str) -> Option<Route> {
        self.state()
            .routes
            .iter()
            .find(|(_, r)| r.guid == guid)
            .map(|(_, r)| r.clone())
    }

    pub fn route_by_host(&self, host: &str) -> Option<Route> {
        self.state()
            .routes
            .iter()
            .find(|(_, r)| r.host == host)
            .map(|(_, r)| r.clone())
    }

    /// Guard every fake operation: record it, fail it if asked to
    fn begin(&self, operation: &'static str) -> Result<MutexGuard<'_, FakeState>, PluginError> {
        let mut state = self.state();
        state.calls.push(operation);
        if state.failing.contains(operation) {
            return Err(PluginError::ApiError {
                status: 500,
                message: format!("injected failure in {}", operation),
            });
        }
        Ok(state)
    }
}

fn add_web_process(state: &mut FakeState, app_guid: &str, states: &[InstanceState]) {
    let process_guid = format!("{}-web", app_guid);
    state.processes.insert(
        app_guid.to_string(),
        vec![Process {
            guid: process_guid.clone(),
            kind: "web".to_string(),
            instances: states.len() as u32,
            memory_in_mb: 1024,
            disk_in_mb: 1024,
            health_check: None,
        }],
    );
    state.instances.insert(
        process_guid,
        states
            .iter()
            .enumerate()
            .map(|(index, s)| ProcessInstance {
                index: index as u32,
                state: s.clone(),
                uptime: 0,
                details: (*s == InstanceState::Crashed).then(|| "exit status 1".to_string()),
            })
            .collect(),
    );
}

fn warned<T>(state: &FakeState, value: T) -> ApiResult<T> {
    Ok(Warned::with_warnings(value, state.warnings.clone()))
}

fn missing(kind: &str, guid: &str) -> PluginError {
    PluginError::ApiError {
        status: 404,
        message: format!("{} {} not found", kind, guid),
    }
}

#[async_trait]
impl TenancyApi for FakeController {
    async fn find_organizations(&self, name: &str) -> ApiResult<Vec<Organization>> {
        let state = self.begin("find_organizations")?;
        let orgs = state.orgs.iter().filter(|o| o.name == name).cloned().collect();
        warned(&state, orgs)
    }

    async fn find_spaces(&self, _organization_guid: &str, name: &str) -> ApiResult<Vec<Space>> {
        let state = self.begin("find_spaces")?;
        let spaces = state.spaces.iter().filter(|s| s.name == name).cloned().collect();
        warned(&state, spaces)
    }

    async fn find_domains(&self, name: &str) -> ApiResult<Vec<Domain>> {
        let state = self.begin("find_domains")?;
        let domains = state.domains.iter().filter(|d| d.name == name).cloned().collect();
        warned(&state, domains)
    }
}

#[async_trait]
impl AppsApi for FakeController {
    async fn find_applications(
        &self,
        _organization_guid: &str,
        _space_guid: &str,
        name: &str,
    ) -> ApiResult<Vec<Application>> {
        let state = self.begin("find_applications")?;
        let apps = state
            .apps
            .iter()
            .filter(|a| a.name == name || state.search_hits.contains(&a.guid))
            .cloned()
            .collect();
        warned(&state, apps)
    }

    async fn create_application(&self, request: &CreateAppRequest) -> ApiResult<Application> {
        let mut state = self.begin("create_application")?;
        let guid = state.next_guid("app");
        let app = Application {
            guid: guid.clone(),
            name: request.name.clone(),
            state: AppState::Stopped,
            lifecycle: Some(request.lifecycle.clone()),
            metadata: request.metadata.clone(),
            created_at: None,
        };
        let instances = state.new_app_instances.clone();
        add_web_process(&mut state, &guid, &instances);
        state.apps.push(app.clone());
        state.created_apps.push(request.clone());
        warned(&state, app)
    }

    async fn delete_application(&self, guid: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_application")?;
        let before = state.apps.len();
        state.apps.retain(|a| a.guid != guid);
        if state.apps.len() == before {
            return Err(missing("app", guid));
        }
        for (_, route) in state.routes.iter_mut() {
            route.destinations.retain(|d| d.app.guid != guid);
        }
        state.deleted_apps.push(guid.to_string());
        warned(&state, ())
    }

    async fn stop_application(&self, guid: &str) -> ApiResult<Application> {
        let mut state = self.begin("stop_application")?;
        let app = match state.apps.iter_mut().find(|a| a.guid == guid) {
            Some(app) => {
                app.state = AppState::Stopped;
                app.clone()
            }
            None => return Err(missing("app", guid)),
        };
        state.stopped_apps.push(guid.to_string());
        warned(&state, app)
    }

    async fn update_environment_variables(
        &self,
        _app_guid: &str,
        vars: &EnvironmentVariables,
    ) -> ApiResult<EnvironmentVariables> {
        let mut state = self.begin("update_environment_variables")?;
        state.env_updates.push(vars.clone());
        warned(&state, vars.clone())
    }

    async fn application_routes(&self, app_guid: &str) -> ApiResult<Vec<Route>> {
        let state = self.begin("application_routes")?;
        let routes = state
            .routes
            .iter()
            .map(|(_, r)| r)
            .filter(|r| r.destinations.iter().any(|d| d.app.guid == app_guid))
            .cloned()
            .collect();
        warned(&state, routes)
    }
}

#[async_trait]
impl ProcessesApi for FakeController {
    async fn application_processes(&self, app_guid: &str) -> ApiResult<Vec<Process>> {
        let state = self.begin("application_processes")?;
        let processes = state.processes.get(app_guid).cloned().unwrap_or_default();
        warned(&state, processes)
    }

    async fn process_instances(&self, process_guid: &str) -> ApiResult<Vec<ProcessInstance>> {
        let state = self.begin("process_instances")?;
        let instances = state.instances.get(process_guid).cloned().unwrap_or_default();
        warned(&state, instances)
    }

    async fn scale_process(
        &self,
        app_guid: &str,
        process_type: &str,
        request: &ScaleProcessRequest,
    ) -> ApiResult<Process> {
        let mut state = self.begin("scale_process")?;
        state.scale_requests.push(request.clone());
        let process = state
            .processes
            .get(app_guid)
            .and_then(|ps| ps.iter().find(|p| p.kind == process_type))
            .cloned()
            .ok_or_else(|| missing("process", process_type))?;
        warned(&state, process)
    }

    async fn update_process(
        &self,
        process_guid: &str,
        request: &UpdateProcessRequest,
    ) -> ApiResult<Process> {
        let mut state = self.begin("update_process")?;
        state.process_updates.push(request.clone());
        let process = state
            .processes
            .values_mut()
            .flat_map(|ps| ps.iter_mut())
            .find(|p| p.guid == process_guid)
            .map(|p| {
                p.health_check = Some(request.health_check.clone());
                p.clone()
            })
            .ok_or_else(|| missing("process", process_guid))?;
        warned(&state, process)
    }
}

#[async_trait]
impl StagingApi for FakeController {
    async fn create_package(&self, request: &CreatePackageRequest) -> ApiResult<Package> {
        let mut state = self.begin("create_package")?;
        state.packages.push(request.clone());
        let package = Package {
            guid: state.next_guid("package"),
            kind: request.kind.clone(),
            data: request.data.clone(),
            state: "READY".to_string(),
        };
        warned(&state, package)
    }

    async fn create_build(&self, _package_guid: &str) -> ApiResult<Build> {
        let mut state = self.begin("create_build")?;
        let build = Build {
            guid: state.next_guid("build"),
            state: BuildState::Staging,
            error: None,
            droplet: None,
            created_at: None,
        };
        warned(&state, build)
    }

    async fn get_build(&self, guid: &str) -> ApiResult<Build> {
        let mut state = self.begin("get_build")?;
        let (build_state, droplet) = if state.build_fails {
            (BuildState::Failed, None)
        } else if state.build_stuck {
            (BuildState::Staging, None)
        } else {
            (BuildState::Staged, Some(GuidRef::new(format!("droplet-of-{}", guid))))
        };
        let build = Build {
            guid: guid.to_string(),
            state: build_state,
            error: state.build_error.take(),
            droplet,
            created_at: None,
        };
        warned(&state, build)
    }

    async fn create_deployment(
        &self,
        _app_guid: &str,
        _droplet_guid: &str,
    ) -> ApiResult<cf_api::Deployment> {
        let mut state = self.begin("create_deployment")?;
        let deployment = cf_api::Deployment {
            guid: state.next_guid("deployment"),
            state: Some("DEPLOYING".to_string()),
        };
        warned(&state, deployment)
    }
}

#[async_trait]
impl RoutesApi for FakeController {
    async fn find_routes(&self, domain_guid: &str, host: &str) -> ApiResult<Vec<Route>> {
        let state = self.begin("find_routes")?;
        let routes = state
            .routes
            .iter()
            .filter(|(d, r)| d == domain_guid && r.host == host)
            .map(|(_, r)| r.clone())
            .collect();
        warned(&state, routes)
    }

    async fn get_route(&self, guid: &str) -> ApiResult<Route> {
        let state = self.begin("get_route")?;
        let route = state
            .routes
            .iter()
            .find(|(_, r)| r.guid == guid)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| missing("route", guid))?;
        warned(&state, route)
    }

    async fn create_route(&self, request: &CreateRouteRequest) -> ApiResult<Route> {
        let mut state = self.begin("create_route")?;
        let domain_guid = request.relationships.domain.guid().unwrap_or_default().to_string();
        let domain_name = state
            .domains
            .iter()
            .find(|d| d.guid == domain_guid)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        let route = Route {
            guid: state.next_guid("route"),
            host: request.host.clone(),
            path: String::new(),
            protocol: "http".to_string(),
            url: format!("{}.{}", request.host, domain_name),
            destinations: Vec::new(),
        };
        state.routes.push((domain_guid, route.clone()));
        warned(&state, route)
    }

    async fn map_route(&self, route_guid: &str, app_guid: &str) -> ApiResult<()> {
        let mut state = self.begin("map_route")?;
        let destination_guid = state.next_guid("dest");
        let route = state
            .routes
            .iter_mut()
            .map(|(_, r)| r)
            .find(|r| r.guid == route_guid)
            .ok_or_else(|| missing("route", route_guid))?;
        if !route.destinations.iter().any(|d| d.app.guid == app_guid) {
            route.destinations.push(RouteDestination {
                guid: destination_guid,
                app: DestinationApp {
                    guid: app_guid.to_string(),
                },
            });
        }
        warned(&state, ())
    }

    async fn unmap_route(&self, route_guid: &str, destination_guid: &str) -> ApiResult<()> {
        let mut state = self.begin("unmap_route")?;
        let route = state
            .routes
            .iter_mut()
            .map(|(_, r)| r)
            .find(|r| r.guid == route_guid)
            .ok_or_else(|| missing("route", route_guid))?;
        route.destinations.retain(|d| d.guid != destination_guid);
        warned(&state, ())
    }

    async fn delete_route(&self, guid: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_route")?;
        state.routes.retain(|(_, r)| r.guid != guid);
        state.deleted_routes.push(guid.to_string());
        warned(&state, ())
    }
}

#[async_trait]
impl ServicesApi for FakeController {
    async fn find_service_instances(
        &self,
        _space_guid: &str,
        name: &str,
    ) -> ApiResult<Vec<ServiceInstance>> {
        let state = self.begin("find_service_instances")?;
        let instances = state.services.iter().filter(|s| s.name == name).cloned().collect();
        warned(&state, instances)
    }

    async fn create_service_binding(&self, request: &CreateServiceBindingRequest) -> ApiResult<()> {
        let mut state = self.begin("create_service_binding")?;
        state.bindings.push(request.clone());
        warned(&state, ())
    }
}
