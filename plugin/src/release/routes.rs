//! Route reconciliation
//!
//! Makes one application the only destination of a route, taking the
//! route over from whatever was mapped before.

use cf_api::{CreateRouteRequest, Domain, Route, RouteRelationships, ToOne};
use tracing::{debug, info};

use crate::controller::{Controller, WarningLogger};
use crate::errors::{PluginError, ResultExt};

/// Outcome of a reconciliation
#[derive(Debug, Clone)]
pub struct ReconciledRoute {
    pub route: Route,

    /// Applications that were mapped before and no longer are
    pub unmapped_apps: Vec<String>,
}

pub struct RouteReconciler<'a, C> {
    cf: &'a WarningLogger<C>,
}

impl<'a, C: Controller> RouteReconciler<'a, C> {
    pub fn new(cf: &'a WarningLogger<C>) -> Self {
        Self { cf }
    }

    /// Look up a domain by name
    pub async fn domain(&self, name: &str) -> Result<Domain, PluginError> {
        let domains = self
            .cf
            .find_domains(name)
            .await
            .context("failed to get specified domain")?;

        domains.into_iter().next().ok_or_else(|| {
            PluginError::NotFound(format!("domain {}", name)).context("failed to get specified domain")
        })
    }

    /// Find the route for `hostname` on `domain`, creating it when missing
    pub async fn upsert_route(
        &self,
        hostname: &str,
        domain: &Domain,
        space_guid: &str,
    ) -> Result<Route, PluginError> {
        let mut routes = self
            .cf
            .find_routes(&domain.guid, hostname)
            .await
            .context("failed to search for route")?;

        match routes.len() {
            0 => {
                let request = CreateRouteRequest {
                    host: hostname.to_string(),
                    relationships: RouteRelationships {
                        space: ToOne::to(space_guid),
                        domain: ToOne::to(domain.guid.as_str()),
                    },
                };
                let route = self
                    .cf
                    .create_route(&request)
                    .await
                    .context("failed to create route")?;
                info!(route = %route.url, "Created route");
                Ok(route)
            }
            1 => Ok(routes.remove(0)),
            n => Err(PluginError::Ambiguous(format!(
                "found {} routes for {}.{}",
                n, hostname, domain.name
            ))),
        }
    }

    /// Map `target_app_guid` and unmap every other destination
    pub async fn reconcile(
        &self,
        hostname: &str,
        domain: &Domain,
        space_guid: &str,
        target_app_guid: &str,
    ) -> Result<ReconciledRoute, PluginError> {
        let route = self.upsert_route(hostname, domain, space_guid).await?;

        self.cf
            .map_route(&route.guid, target_app_guid)
            .await
            .context("failed to map route")?;

        let mut route = self
            .cf
            .get_route(&route.guid)
            .await
            .context("failed to get route")?;

        let mut unmapped_apps = Vec::new();
        for destination in route.destinations.iter().filter(|d| d.app.guid != target_app_guid) {
            debug!(route = %route.url, app = %destination.app.guid, "Unmapping previous destination");
            self.cf
                .unmap_route(&route.guid, &destination.guid)
                .await
                .context(format!(
                    "failed to unmap route from destination app with GUID {}",
                    destination.app.guid
                ))?;
            if !unmapped_apps.contains(&destination.app.guid) {
                unmapped_apps.push(destination.app.guid.clone());
            }
        }
        route.destinations.retain(|d| d.app.guid == target_app_guid);

        Ok(ReconciledRoute {
            route,
            unmapped_apps,
        })
    }
}
