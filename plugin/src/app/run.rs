//! Stage dispatch

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::app::options::{CliOptions, Command};
use crate::config::settings::Settings;
use crate::config::target::ControllerTarget;
use crate::controller::WarningLogger;
use crate::deploy::{DeployRequest, DeploySettings, Destroyer, Orchestrator};
use crate::errors::PluginError;
use crate::filesys::file::File;
use crate::health::platform_status;
use crate::http::HttpClient;
use crate::models::{Deployment, ImageRef, Release};
use crate::release::Releaser;
use crate::terminal::{ConsoleSteps, Steps};
use crate::utils::deployment_name;

/// Run one lifecycle stage against the controller
pub async fn run(options: &CliOptions, mut settings: Settings) -> Result<(), PluginError> {
    if let Some(env_file) = &options.env_file {
        settings.platform.env_from_file = File::new(env_file).read_string().await?;
    }

    let target = ControllerTarget::from_env().await?;
    info!("Using Cloud Controller at {}", target.api_url);

    let cf = WarningLogger::new(Arc::new(HttpClient::new(&target)?));
    let steps: Arc<dyn Steps> = Arc::new(ConsoleSteps);

    match options.command {
        Command::Deploy => {
            let request = DeployRequest {
                app_name: options.require_app_name()?.to_string(),
                image: options.require_image()?.parse::<ImageRef>()?,
            };
            let orchestrator =
                Orchestrator::new(cf, settings.platform, DeploySettings::default(), steps);
            let deployment = orchestrator.deploy(&request).await?;
            persist(&options.deployment_file, &deployment).await?;
        }
        Command::Destroy => {
            let mut deployment: Deployment = File::new(&options.deployment_file).read_json().await?;
            if deployment.name.is_empty() {
                deployment.name = deployment_name(options.require_app_name()?, &deployment.id);
            }
            Destroyer::new(cf, steps).destroy(&deployment).await?;
        }
        Command::Release => {
            let deployment: Deployment = File::new(&options.deployment_file).read_json().await?;
            let release = Releaser::new(cf, settings.release, steps)
                .release(&deployment)
                .await?;
            persist(&options.release_file, &release).await?;
        }
        Command::Status => {
            let deployment: Deployment = File::new(&options.deployment_file).read_json().await?;
            print_json(&platform_status(&cf, &deployment).await?)?;
        }
        Command::ReleaseStatus => {
            let release: Release = File::new(&options.release_file).read_json().await?;
            let report = Releaser::new(cf, settings.release, steps)
                .status(&release)
                .await?;
            print_json(&report)?;
        }
        Command::Version => {}
    }

    Ok(())
}

/// Write the record for the next stage and echo it on stdout
async fn persist<T: Serialize>(path: &std::path::Path, record: &T) -> Result<(), PluginError> {
    File::new(path).write_json(record).await?;
    info!("Wrote {}", path.display());
    print_json(record)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), PluginError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
