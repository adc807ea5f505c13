//! Deployment removal

use std::sync::Arc;

use tracing::{info, warn};

use crate::controller::{Controller, WarningLogger};
use crate::errors::{PluginError, ResultExt};
use crate::models::Deployment;
use crate::terminal::{run_step, Steps};

pub struct Destroyer<C> {
    cf: WarningLogger<C>,
    steps: Arc<dyn Steps>,
}

impl<C: Controller> Destroyer<C> {
    pub fn new(cf: WarningLogger<C>, steps: Arc<dyn Steps>) -> Self {
        Self { cf, steps }
    }

    /// Delete the deployment's application and its own route
    ///
    /// A missing application is not an error. Only the route whose host is
    /// the deployment name is deleted; release routes are left alone.
    pub async fn destroy(&self, deployment: &Deployment) -> Result<(), PluginError> {
        if deployment.name.is_empty() {
            return Err(PluginError::Validation("deployment name cannot be empty".to_string()));
        }
        let name = deployment.name.as_str();

        let apps = run_step(
            self.steps.as_ref(),
            &format!("Getting app info for {}", name),
            async {
                self.cf
                    .find_applications(&deployment.organisation_guid, &deployment.space_guid, name)
                    .await
                    .context("failed to get app info")
            },
        )
        .await?;

        let Some(app) = apps.into_iter().next() else {
            info!(deployment = %name, "Application already gone");
            return Ok(());
        };

        let description = format!("Deleting app routes for {}", name);
        let mut step = self.steps.add(&description);
        let routes = match self.cf.application_routes(&app.guid).await {
            Ok(routes) => routes,
            Err(e) => {
                step.abort();
                return Err(e.context("failed to get app routes"));
            }
        };
        for route in routes.iter().filter(|r| r.host == name) {
            if let Err(e) = self.cf.delete_route(&route.guid).await {
                warn!(route = %route.url, "Unable to delete route: {}", e);
                step.update(&format!("{} [failed to delete route]", description));
            }
        }
        step.done();

        run_step(
            self.steps.as_ref(),
            &format!("Deleting app {}", app.name),
            async {
                match self.cf.delete_application(&app.guid).await {
                    Err(e) if e.is_not_found() => {
                        info!(deployment = %name, "Application deleted concurrently");
                        Ok(())
                    }
                    result => result.context("failed to delete app"),
                }
            },
        )
        .await?;

        info!(deployment = %name, "Deployment destroyed");
        Ok(())
    }
}
