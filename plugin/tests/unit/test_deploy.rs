//! Deploy pipeline tests

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use cf_api::{InstanceState, ServiceInstance};
use cfdeploy::config::settings::{DockerConfig, HealthCheckConfig, PlatformConfig, QuotaConfig};
use cfdeploy::deploy::orchestrator::APP_NAME_LABEL;
use cfdeploy::deploy::{DeployRequest, DeploySettings, Orchestrator};
use cfdeploy::errors::PluginError;
use cfdeploy::models::ImageRef;
use cfdeploy::terminal::NoopSteps;

use crate::fake::{FakeController, DOMAIN, ORG, SPACE};

fn platform() -> PlatformConfig {
    PlatformConfig {
        organisation: ORG.to_string(),
        space: SPACE.to_string(),
        domain: DOMAIN.to_string(),
        ..PlatformConfig::default()
    }
}

fn fast_settings() -> DeploySettings {
    DeploySettings {
        deployment_timeout: Duration::from_millis(200),
        staging_timeout: Duration::from_millis(200),
        build_poll_interval: Duration::from_millis(1),
        process_poll_interval: Duration::from_millis(5),
    }
}

fn request() -> DeployRequest {
    DeployRequest {
        app_name: "shop".to_string(),
        image: ImageRef::new("registry.example.com/team/shop", "1.4.2"),
    }
}

fn orchestrator(fake: &Arc<FakeController>, config: PlatformConfig) -> Orchestrator<FakeController> {
    Orchestrator::new(fake.logger(), config, fast_settings(), Arc::new(NoopSteps))
}

#[tokio::test]
async fn test_deploy_success() {
    let fake = FakeController::new();
    fake.state().services.push(ServiceInstance {
        guid: "svc-db".to_string(),
        name: "db".to_string(),
    });
    fake.state().warnings = vec!["stack is deprecated".to_string()];

    let config = PlatformConfig {
        quota: Some(QuotaConfig {
            memory: "512Mi".to_string(),
            disk: String::new(),
            instances: 2,
        }),
        health_check: Some(HealthCheckConfig {
            kind: "http".to_string(),
            endpoint: "/health".to_string(),
            invocation_timeout: 5,
            timeout: 60,
        }),
        env: BTreeMap::from([("LOG_LEVEL".to_string(), "debug".to_string())]),
        env_from_file: "# defaults\nLOG_LEVEL=info\nREGION=eu\n".to_string(),
        service_bindings: vec!["db".to_string()],
        ..platform()
    };

    let deployment = orchestrator(&fake, config).deploy(&request()).await.unwrap();

    assert!(deployment.name.starts_with("shop-"));
    assert_eq!(deployment.name, format!("shop-{}", deployment.id));
    assert_eq!(deployment.id.len(), 8);
    assert_eq!(deployment.organisation_guid, "org-1");
    assert_eq!(deployment.space_guid, "space-1");
    assert_eq!(deployment.url, format!("{}.{}", deployment.name, DOMAIN));

    let state = fake.state();
    assert!(state.deleted_apps.is_empty());

    let created = &state.created_apps[0];
    assert_eq!(created.name, deployment.name);
    assert_eq!(created.lifecycle.kind, "docker");
    assert_eq!(
        created.metadata.as_ref().unwrap().labels.get(APP_NAME_LABEL),
        Some(&"shop".to_string())
    );
    let app = state.apps.iter().find(|a| a.name == deployment.name).unwrap();
    assert_eq!(app.guid, deployment.app_guid);

    assert_eq!(state.packages[0].data.image, "registry.example.com/team/shop:1.4.2");
    assert_eq!(state.packages[0].data.username, None);

    assert_eq!(state.scale_requests.len(), 1);
    assert_eq!(state.scale_requests[0].memory_in_mb, Some(512));
    assert_eq!(state.scale_requests[0].instances, Some(2));
    assert_eq!(state.scale_requests[0].disk_in_mb, None);

    let env = &state.env_updates[0].var;
    assert_eq!(env.get("LOG_LEVEL"), Some(&Some("debug".to_string())));
    assert_eq!(env.get("REGION"), Some(&Some("eu".to_string())));

    assert_eq!(state.bindings.len(), 1);
    assert_eq!(state.bindings[0].kind, "app");
    assert_eq!(state.bindings[0].relationships.service_instance.guid(), Some("svc-db"));

    let health_check = &state.process_updates[0].health_check;
    assert_eq!(health_check.kind, "http");
    assert_eq!(health_check.data.endpoint.as_deref(), Some("/health"));
    assert_eq!(health_check.data.timeout, Some(60));
    assert_eq!(health_check.data.invocation_timeout, Some(5));
    drop(state);

    let route = fake.route_by_host(&deployment.name).unwrap();
    assert_eq!(route.destinations.len(), 1);
    assert_eq!(route.destinations[0].app.guid, deployment.app_guid);
}

#[tokio::test]
async fn test_deploy_skips_optional_phases() {
    let fake = FakeController::new();

    orchestrator(&fake, platform()).deploy(&request()).await.unwrap();

    let state = fake.state();
    assert!(state.scale_requests.is_empty());
    assert!(state.env_updates.is_empty());
    assert!(state.bindings.is_empty());
    assert!(state.process_updates.is_empty());
    assert!(!state.calls.contains(&"find_service_instances"));
}

#[tokio::test]
async fn test_invalid_quota_makes_no_remote_calls() {
    let fake = FakeController::new();
    let config = PlatformConfig {
        quota: Some(QuotaConfig {
            memory: "lots".to_string(),
            ..QuotaConfig::default()
        }),
        ..platform()
    };

    let err = orchestrator(&fake, config).deploy(&request()).await.unwrap_err();

    assert!(matches!(err, PluginError::Validation(_)));
    assert!(err.to_string().starts_with("unable to parse memory"));
    assert!(fake.state().calls.is_empty());
}

#[tokio::test]
async fn test_invalid_health_check_makes_no_remote_calls() {
    let fake = FakeController::new();
    let config = PlatformConfig {
        health_check: Some(HealthCheckConfig {
            kind: "http".to_string(),
            ..HealthCheckConfig::default()
        }),
        ..platform()
    };

    let err = orchestrator(&fake, config).deploy(&request()).await.unwrap_err();

    assert_eq!(err.to_string(), "undefined endpoint for HTTP health check");
    assert!(fake.state().calls.is_empty());
}

#[tokio::test]
async fn test_ambiguous_organisation_creates_nothing() {
    let fake = FakeController::new();
    let duplicate = fake.state().orgs[0].clone();
    fake.state().orgs.push(duplicate);

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(matches!(err.root(), PluginError::Ambiguous(_)));
    assert!(err.to_string().contains("failed to select organisation"));
    let state = fake.state();
    assert!(state.created_apps.is_empty());
    assert!(state.deleted_apps.is_empty());
}

#[tokio::test]
async fn test_package_failure_cleans_up_once() {
    let fake = FakeController::new();
    fake.fail("create_package");

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to create package"));
    let state = fake.state();
    assert_eq!(state.created_apps.len(), 1);
    assert_eq!(state.deleted_apps.len(), 1);
    assert!(state.apps.is_empty());
}

#[tokio::test]
async fn test_missing_docker_password_cleans_up() {
    let fake = FakeController::new();
    let config = PlatformConfig {
        docker: Some(DockerConfig {
            username: "robot".to_string(),
            password: None,
        }),
        ..platform()
    };

    let err = orchestrator(&fake, config).deploy(&request()).await.unwrap_err();

    assert!(matches!(err.root(), PluginError::Validation(_)));
    assert!(err.to_string().contains("password is empty"));
    let state = fake.state();
    assert!(!state.calls.contains(&"create_package"));
    assert_eq!(state.deleted_apps.len(), 1);
}

#[tokio::test]
async fn test_failed_staging_cleans_up() {
    let fake = FakeController::new();
    {
        let mut state = fake.state();
        state.build_fails = true;
        state.build_error = Some("StagingError - image not found".to_string());
    }

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(matches!(err.root(), PluginError::StagingFailed(_)));
    assert!(err.to_string().contains("image not found"));
    assert_eq!(fake.state().deleted_apps.len(), 1);
}

#[tokio::test]
async fn test_crashed_instance_fails_and_cleans_up() {
    let fake = FakeController::new();
    fake.state().new_app_instances = vec![InstanceState::Running, InstanceState::Crashed];

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(matches!(err, PluginError::ProcessCrashed(_)));
    let message = err.to_string();
    assert!(message.contains("processInstance=1"));
    assert!(message.contains("exit status 1"));

    let state = fake.state();
    assert_eq!(state.deleted_apps.len(), 1);
    assert!(!state.calls.contains(&"create_route"));
}

#[tokio::test]
async fn test_processes_never_start_times_out() {
    let fake = FakeController::new();
    fake.state().new_app_instances = vec![InstanceState::Starting];

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(matches!(err, PluginError::Timeout(_)));
    let message = err.to_string();
    assert!(message.contains("isn't started yet"));
    assert!(message.contains("STARTING"));
    assert_eq!(fake.state().deleted_apps.len(), 1);
}

#[tokio::test]
async fn test_cleanup_failure_keeps_original_error() {
    let fake = FakeController::new();
    fake.fail("create_deployment");
    fake.fail("delete_application");

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to create deployment"));
    let state = fake.state();
    assert!(state.deleted_apps.is_empty());
    assert_eq!(
        state.calls.iter().filter(|c| **c == "delete_application").count(),
        1
    );
}

#[tokio::test]
async fn test_existing_app_is_deleted_before_create() {
    let fake = FakeController::new();
    let existing = fake.add_app("shop-0f0f0f0f", &[InstanceState::Running]);
    fake.state().search_hits = vec![existing.clone()];

    let deployment = orchestrator(&fake, platform()).deploy(&request()).await.unwrap();

    let state = fake.state();
    assert_eq!(state.deleted_apps, vec![existing.clone()]);
    assert_ne!(deployment.app_guid, existing);
    let position = |op: &str| state.calls.iter().position(|c| *c == op).unwrap();
    assert!(position("delete_application") < position("create_application"));
}

#[tokio::test]
async fn test_failed_existing_app_delete_is_fatal() {
    let fake = FakeController::new();
    let existing = fake.add_app("shop-0f0f0f0f", &[InstanceState::Running]);
    fake.state().search_hits = vec![existing];
    fake.fail("delete_application");

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to delete app"));
    let state = fake.state();
    assert!(!state.calls.contains(&"create_application"));
    assert!(state.created_apps.is_empty());
    assert_eq!(state.apps.len(), 1);
}

#[tokio::test]
async fn test_staging_timeout_cleans_up() {
    let fake = FakeController::new();
    fake.state().build_stuck = true;

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(matches!(err, PluginError::Timeout(_)));
    let message = err.to_string();
    assert!(message.contains("build build-3"));
    assert!(message.contains("Staging"));
    let state = fake.state();
    assert_eq!(state.deleted_apps.len(), 1);
    assert!(!state.calls.contains(&"create_deployment"));
}

#[tokio::test]
async fn test_route_binding_failure_cleans_up() {
    let fake = FakeController::new();
    fake.fail("create_route");

    let err = orchestrator(&fake, platform()).deploy(&request()).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to create route"));
    assert_eq!(fake.state().deleted_apps, vec!["app-1".to_string()]);
}

#[tokio::test]
async fn test_ambiguous_service_instance_cleans_up() {
    let fake = FakeController::new();
    for guid in ["svc-1", "svc-2"] {
        fake.state().services.push(ServiceInstance {
            guid: guid.to_string(),
            name: "db".to_string(),
        });
    }
    let config = PlatformConfig {
        service_bindings: vec!["db".to_string()],
        ..platform()
    };

    let err = orchestrator(&fake, config).deploy(&request()).await.unwrap_err();

    assert!(matches!(err.root(), PluginError::Ambiguous(_)));
    assert!(err.to_string().starts_with("unable to get service db"));
    let state = fake.state();
    assert!(state.bindings.is_empty());
    assert_eq!(state.deleted_apps.len(), 1);
}

#[tokio::test]
async fn test_missing_service_instance_cleans_up() {
    let fake = FakeController::new();
    let config = PlatformConfig {
        service_bindings: vec!["cache".to_string()],
        ..platform()
    };

    let err = orchestrator(&fake, config).deploy(&request()).await.unwrap_err();

    assert!(matches!(err.root(), PluginError::NotFound(_)));
    assert!(err.to_string().starts_with("unable to get service cache"));
    let state = fake.state();
    assert!(!state.calls.contains(&"create_build"));
    assert_eq!(state.deleted_apps.len(), 1);
}
