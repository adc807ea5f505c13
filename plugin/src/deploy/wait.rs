//! Polling loops for staging and process convergence

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use cf_api::{Build, BuildState, InstanceState, Process, ProcessInstance};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::controller::{Controller, WarningLogger};
use crate::errors::PluginError;
use crate::terminal::Step;

/// Poll the build until it is staged
///
/// A failed build, or any build error, aborts. Errors fetching the build
/// are logged and the poll continues until `timeout`.
pub async fn wait_for_build<C: Controller>(
    cf: &WarningLogger<C>,
    step: &mut dyn Step,
    description: &str,
    mut build: Build,
    interval: Duration,
    timeout: Duration,
) -> Result<Build, PluginError> {
    let deadline = Instant::now() + timeout;

    loop {
        if build.state == BuildState::Failed || build.error_message().is_some() {
            return Err(PluginError::StagingFailed(
                build
                    .error_message()
                    .unwrap_or("build reported FAILED without an error")
                    .to_string(),
            ));
        }
        if build.state == BuildState::Staged {
            return Ok(build);
        }
        if Instant::now() >= deadline {
            return Err(PluginError::Timeout(format!(
                "{:.0} seconds elapsed but build {} is still {:?}",
                timeout.as_secs_f64(),
                build.guid,
                build.state
            )));
        }

        sleep(interval).await;
        match cf.get_build(&build.guid).await {
            Ok(latest) => {
                debug!(build = %latest.guid, state = ?latest.state, "Build update");
                build = latest;
                step.update(&format!("{} [{:?}]", description, build.state));
            }
            Err(e) => warn!("Unable to fetch build {}: {}", build.guid, e),
        }
    }
}

/// Last observed instances per process
#[derive(Debug, Default)]
pub struct ProcessSnapshot(BTreeMap<String, Vec<InstanceState>>);

impl ProcessSnapshot {
    fn record(&mut self, process: &Process, instances: &[ProcessInstance]) {
        self.0.insert(
            format!("{}({})", process.kind, process.guid),
            instances.iter().map(|i| i.state.clone()).collect(),
        );
    }
}

impl fmt::Display for ProcessSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (process, states)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let states: Vec<&str> = states.iter().map(|s| s.as_str()).collect();
            write!(f, "{}: [{}]", process, states.join(", "))?;
        }
        f.write_str("}")
    }
}

/// Poll every instance of the app's processes until none is starting
///
/// A crashed instance fails immediately. The process list is read once.
pub async fn wait_for_processes<C: Controller>(
    cf: &WarningLogger<C>,
    deployment_name: &str,
    app_guid: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<(), PluginError> {
    let processes = cf.application_processes(app_guid).await.map_err(|e| {
        e.context("unable to get application processes")
    })?;

    let deadline = Instant::now() + timeout;
    let mut snapshot = ProcessSnapshot::default();

    loop {
        if Instant::now() >= deadline {
            return Err(PluginError::Timeout(format!(
                "{:.0} seconds elapsed but the application isn't started yet. deployment={}, processes={}",
                timeout.as_secs_f64(),
                deployment_name,
                snapshot
            )));
        }

        let mut starting = false;
        for process in &processes {
            let instances = cf.process_instances(&process.guid).await.map_err(|e| {
                e.context(format!("unable to get process instances for process {}", process.guid))
            })?;
            snapshot.record(process, &instances);

            for instance in &instances {
                match instance.state {
                    InstanceState::Crashed => {
                        return Err(PluginError::ProcessCrashed(format!(
                            "process={}({}), processInstance={} {}",
                            process.kind,
                            process.guid,
                            instance.index,
                            instance.details.as_deref().unwrap_or("")
                        )
                        .trim_end()
                        .to_string()));
                    }
                    InstanceState::Starting => starting = true,
                    _ => {}
                }
            }
        }

        if !starting {
            info!(processes = %snapshot, "Processes are ready");
            return Ok(());
        }

        sleep(interval).await;
    }
}
