//! Finite state machine for the deploy pipeline

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PluginError;

/// Deploy timings
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Default bound on process convergence
    pub deployment_timeout: Duration,

    /// Default bound on staging
    pub staging_timeout: Duration,

    /// Delay between build status polls
    pub build_poll_interval: Duration,

    /// Delay between process instance polls
    pub process_poll_interval: Duration,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            deployment_timeout: Duration::from_secs(5 * 60),
            staging_timeout: Duration::from_secs(15 * 60),
            build_poll_interval: Duration::from_millis(500),
            process_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Pipeline phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    Pending,
    ResolvingTenancy,
    ReplacingExisting,
    CreatingApp,
    ApplyingQuota,
    CreatingPackage,
    SettingEnvironment,
    BindingServices,
    Staging,
    CreatingDeployment,
    WaitingForProcesses,
    ConfiguringHealthCheck,
    BindingRoute,
    Deployed,
    Failed,
}

impl DeployPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployPhase::Pending => "pending",
            DeployPhase::ResolvingTenancy => "resolving organisation and space",
            DeployPhase::ReplacingExisting => "replacing existing application",
            DeployPhase::CreatingApp => "creating application",
            DeployPhase::ApplyingQuota => "applying quota",
            DeployPhase::CreatingPackage => "creating package",
            DeployPhase::SettingEnvironment => "setting environment variables",
            DeployPhase::BindingServices => "binding services",
            DeployPhase::Staging => "staging",
            DeployPhase::CreatingDeployment => "creating deployment",
            DeployPhase::WaitingForProcesses => "waiting for processes",
            DeployPhase::ConfiguringHealthCheck => "configuring health check",
            DeployPhase::BindingRoute => "binding route",
            DeployPhase::Deployed => "deployed",
            DeployPhase::Failed => "failed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, DeployPhase::Deployed | DeployPhase::Failed)
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deploy FSM
///
/// Phases only move forward. Cleanup is armed when the application has been
/// created and disarmed only by reaching `Deployed`.
#[derive(Debug, Clone)]
pub struct DeployFsm {
    phase: DeployPhase,
    app_created: bool,
    failed_in: Option<DeployPhase>,
}

impl DeployFsm {
    pub fn new() -> Self {
        Self {
            phase: DeployPhase::Pending,
            app_created: false,
            failed_in: None,
        }
    }

    pub fn phase(&self) -> DeployPhase {
        self.phase
    }

    /// Phase that was active when the pipeline failed
    pub fn failed_in(&self) -> Option<DeployPhase> {
        self.failed_in
    }

    /// Whether a failure now must delete the created application
    pub fn should_cleanup(&self) -> bool {
        self.app_created && self.phase != DeployPhase::Deployed
    }

    /// Enter the next phase
    pub fn enter(&mut self, next: DeployPhase) -> Result<(), PluginError> {
        if self.phase.is_terminal() || next <= self.phase || next.is_terminal() {
            return Err(PluginError::Internal(format!(
                "invalid deploy transition: {} -> {}",
                self.phase, next
            )));
        }
        self.phase = next;
        Ok(())
    }

    /// Record that the application now exists remotely
    pub fn app_created(&mut self) {
        self.app_created = true;
    }

    pub fn succeed(&mut self) -> Result<(), PluginError> {
        if self.phase != DeployPhase::BindingRoute {
            return Err(PluginError::Internal(format!(
                "invalid deploy transition: {} -> {}",
                self.phase,
                DeployPhase::Deployed
            )));
        }
        self.phase = DeployPhase::Deployed;
        Ok(())
    }

    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.failed_in = Some(self.phase);
            self.phase = DeployPhase::Failed;
        }
    }
}

impl Default for DeployFsm {
    fn default() -> Self {
        Self::new()
    }
}
