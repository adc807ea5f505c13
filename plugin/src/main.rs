//! cfdeploy - Entry Point
//!
//! Deploys container images to Cloud Foundry and moves release routes
//! between deployments. Each invocation runs one lifecycle stage.

use std::env;
use std::process::ExitCode;

use cfdeploy::app::options::{CliOptions, Command};
use cfdeploy::app::run::run;
use cfdeploy::config::settings::Settings;
use cfdeploy::filesys::file::File;
use cfdeploy::logs::{init_logging, LogOptions};
use cfdeploy::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let options = match CliOptions::parse(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: cfdeploy <deploy|destroy|release|status|release-status|version> [--config=cfdeploy.json] [--app=<name>] [--image=<ref>]");
            return ExitCode::from(2);
        }
    };

    // Print version and exit
    let version = version_info();
    if options.command == Command::Version {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{e}"),
        }
        return ExitCode::SUCCESS;
    }

    // Retrieve the settings file
    let mut settings = match File::new(&options.config_file).read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return ExitCode::FAILURE;
        }
    };
    settings.apply_env(|key| env::var(key).ok());

    // Initialize logging
    let log_options = LogOptions {
        log_level: options.log_level.unwrap_or(settings.log_level),
        json_format: settings.json_logs,
    };
    let _guard = match init_logging(log_options) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    info!(command = ?options.command, version = %version.version, "Running cfdeploy");
    match run(&options, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?} failed: {}", options.command, e);
            ExitCode::FAILURE
        }
    }
}
