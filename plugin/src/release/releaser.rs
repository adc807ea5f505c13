//! Releaser
//!
//! Moves the release routes onto a deployment and reports the health of
//! whatever a release route currently points at.

use std::sync::Arc;

use cf_api::Route;
use tracing::{debug, info};

use crate::config::settings::ReleaseConfig;
use crate::controller::{Controller, WarningLogger};
use crate::errors::{PluginError, ResultExt};
use crate::health::{application_health, summarize};
use crate::models::{Deployment, Health, Release, StatusReport};
use crate::release::routes::RouteReconciler;
use crate::terminal::{run_step, Steps};

pub struct Releaser<C> {
    cf: WarningLogger<C>,
    config: ReleaseConfig,
    steps: Arc<dyn Steps>,
}

impl<C: Controller> Releaser<C> {
    pub fn new(cf: WarningLogger<C>, config: ReleaseConfig, steps: Arc<dyn Steps>) -> Self {
        Self { cf, config, steps }
    }

    /// Map the primary and additional routes to the deployment
    ///
    /// Routes are reconciled one by one; a failure leaves the routes already
    /// handled as they are.
    pub async fn release(&self, deployment: &Deployment) -> Result<Release, PluginError> {
        run_step(
            self.steps.as_ref(),
            &format!("Getting app info for {}", deployment.name),
            async {
                let apps = self
                    .cf
                    .find_applications(
                        &deployment.organisation_guid,
                        &deployment.space_guid,
                        &deployment.name,
                    )
                    .await
                    .context("failed to get app info")?;
                if apps.is_empty() {
                    return Err(PluginError::NotFound(deployment.name.clone())
                        .context("release failed, app not found"));
                }
                Ok(())
            },
        )
        .await?;

        let reconciler = RouteReconciler::new(&self.cf);
        let domain = run_step(
            self.steps.as_ref(),
            &format!("Looking up domain {}", self.config.domain),
            reconciler.domain(&self.config.domain),
        )
        .await?;

        let mut hostnames = Vec::new();
        if self.config.hostname.is_empty() {
            debug!("No release hostname configured, skipping the primary route");
        } else {
            hostnames.push(self.config.hostname.as_str());
        }
        hostnames.extend(self.config.additional_routes.iter().map(String::as_str));

        let mut release_route: Option<Route> = None;
        let mut unmapped_apps: Vec<String> = Vec::new();

        for hostname in hostnames {
            let description = format!("Binding route {}.{} to deployment", hostname, domain.name);
            let reconciled = run_step(
                self.steps.as_ref(),
                &description,
                reconciler.reconcile(hostname, &domain, &deployment.space_guid, &deployment.app_guid),
            )
            .await?;

            for app_guid in reconciled.unmapped_apps {
                if app_guid != deployment.app_guid && !unmapped_apps.contains(&app_guid) {
                    unmapped_apps.push(app_guid);
                }
            }
            if release_route.is_none() {
                release_route = Some(reconciled.route);
            }
        }

        if self.config.stop_old_instances {
            self.stop_previous(&unmapped_apps).await?;
        }

        let release = release_route
            .map(|route| Release {
                url: format!("{}://{}", route.protocol, route.url),
                route_guid: route.guid,
            })
            .unwrap_or_default();
        info!(url = %release.url, "Release finished");
        Ok(release)
    }

    async fn stop_previous(&self, app_guids: &[String]) -> Result<(), PluginError> {
        for app_guid in app_guids {
            run_step(
                self.steps.as_ref(),
                &format!("Stopping previous application {}", app_guid),
                async {
                    self.cf
                        .stop_application(app_guid)
                        .await
                        .context(format!("failed to stop previous application {}", app_guid))?;
                    Ok(())
                },
            )
            .await?;
        }
        Ok(())
    }

    /// Health of every application the release route points at
    pub async fn status(&self, release: &Release) -> Result<StatusReport, PluginError> {
        if release.route_guid.is_empty() {
            return Err(PluginError::Validation("route GUID cannot be empty".to_string()));
        }

        run_step(self.steps.as_ref(), "Getting health for release", async {
            let route = self.cf.get_route(&release.route_guid).await.context(format!(
                "unable to get route for route GUID {}",
                release.route_guid
            ))?;

            if route.destinations.is_empty() {
                return Ok(StatusReport::new(Health::Down, "route has no destinations"));
            }

            let mut app_guids: Vec<&str> = Vec::new();
            for destination in &route.destinations {
                if !app_guids.contains(&destination.app.guid.as_str()) {
                    app_guids.push(&destination.app.guid);
                }
            }

            let mut reports = Vec::with_capacity(app_guids.len());
            for app_guid in app_guids {
                reports.push(application_health(&self.cf, app_guid).await?);
            }

            summarize(&reports).ok_or_else(|| {
                PluginError::Internal("no health reports for a route with destinations".to_string())
            })
        })
        .await
    }
}
