//! Health aggregation
//!
//! Per-application health is derived from process instance states; several
//! reports are combined by keeping the worst health.

mod classify;

pub use classify::{classify, InstanceCounts};

use tracing::debug;

use crate::controller::{Controller, WarningLogger};
use crate::errors::{PluginError, ResultExt};
use crate::models::{Deployment, Health, StatusReport};

/// Combine reports: worst health, messages joined in order, `external` of the first
///
/// Returns `None` for an empty input.
pub fn summarize(reports: &[StatusReport]) -> Option<StatusReport> {
    let first = reports.first()?;

    let health = reports
        .iter()
        .fold(Health::Ready, |acc, report| acc.worst(report.health));
    let health_message = reports
        .iter()
        .map(|report| report.health_message.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Some(StatusReport {
        health,
        health_message,
        external: first.external,
    })
}

/// Health of one application across all of its processes
pub async fn application_health<C: Controller>(
    cf: &WarningLogger<C>,
    app_guid: &str,
) -> Result<StatusReport, PluginError> {
    let processes = cf
        .application_processes(app_guid)
        .await
        .context("error getting application processes")?;

    let mut counts = InstanceCounts::default();
    for process in &processes {
        let instances = cf.process_instances(&process.guid).await.context(format!(
            "error getting process instances for {} (part of {})",
            process.guid, app_guid
        ))?;
        counts.extend(instances.iter().map(|instance| instance.state.clone()));
    }

    let report = classify(&counts);
    debug!(app_guid, health = %report.health, "Application health");
    Ok(report)
}

/// Health of a deployment without any route context
pub async fn platform_status<C: Controller>(
    cf: &WarningLogger<C>,
    deployment: &Deployment,
) -> Result<StatusReport, PluginError> {
    application_health(cf, &deployment.app_guid).await
}
