//! Command line options

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::PluginError;
use crate::logs::LogLevel;

pub const DEFAULT_CONFIG_FILE: &str = "cfdeploy.json";
pub const DEFAULT_DEPLOYMENT_FILE: &str = "deployment.json";
pub const DEFAULT_RELEASE_FILE: &str = "release.json";

/// Lifecycle stage to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Deploy,
    Destroy,
    Release,
    /// Health of a deployment
    Status,
    /// Health of a release route
    ReleaseStatus,
    Version,
}

impl FromStr for Command {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploy" => Ok(Command::Deploy),
            "destroy" => Ok(Command::Destroy),
            "release" => Ok(Command::Release),
            "status" => Ok(Command::Status),
            "release-status" => Ok(Command::ReleaseStatus),
            "version" => Ok(Command::Version),
            other => Err(PluginError::ConfigError(format!(
                "unknown command {:?}, expected one of deploy, destroy, release, status, release-status, version",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub command: Command,

    /// Settings file
    pub config_file: PathBuf,

    /// Source application name; required by deploy, and by destroy for unnamed records
    pub app_name: Option<String>,

    /// Image reference; required by deploy
    pub image: Option<String>,

    /// Dotenv file whose content replaces `platform.env_from_file`
    pub env_file: Option<PathBuf>,

    /// Deployment record written by deploy and read by the later stages
    pub deployment_file: PathBuf,

    /// Release record written by release and read by release-status
    pub release_file: PathBuf,

    /// Overrides the settings file log level
    pub log_level: Option<LogLevel>,
}

impl CliOptions {
    /// Parse `<command> --key=value ... --flag`
    pub fn parse<I>(args: I) -> Result<Self, PluginError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut command = None;
        let mut cli_args: HashMap<String, String> = HashMap::new();

        for arg in args {
            if let Some((key, value)) = arg.split_once('=') {
                let clean_key = key.trim_start_matches('-');
                cli_args.insert(clean_key.to_string(), value.to_string());
            } else if arg.starts_with("--") {
                let clean_key = arg.trim_start_matches('-');
                cli_args.insert(clean_key.to_string(), "true".to_string());
            } else if command.is_none() {
                command = Some(arg.parse::<Command>()?);
            } else {
                return Err(PluginError::ConfigError(format!("unexpected argument {:?}", arg)));
            }
        }

        let command = match command {
            Some(command) => command,
            None if cli_args.contains_key("version") => Command::Version,
            None => {
                return Err(PluginError::ConfigError(
                    "missing command, expected one of deploy, destroy, release, status, release-status, version"
                        .to_string(),
                ))
            }
        };

        let log_level = cli_args
            .get("log-level")
            .map(|level| level.parse::<LogLevel>())
            .transpose()?;

        Ok(Self {
            command,
            config_file: path_arg(&cli_args, "config", DEFAULT_CONFIG_FILE),
            app_name: cli_args.get("app").cloned(),
            image: cli_args.get("image").cloned(),
            env_file: cli_args.get("env-file").map(PathBuf::from),
            deployment_file: path_arg(&cli_args, "deployment", DEFAULT_DEPLOYMENT_FILE),
            release_file: path_arg(&cli_args, "release", DEFAULT_RELEASE_FILE),
            log_level,
        })
    }

    pub fn require_app_name(&self) -> Result<&str, PluginError> {
        self.app_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PluginError::ConfigError("--app=<name> is required".to_string()))
    }

    pub fn require_image(&self) -> Result<&str, PluginError> {
        self.image
            .as_deref()
            .filter(|image| !image.is_empty())
            .ok_or_else(|| PluginError::ConfigError("--image=<reference> is required".to_string()))
    }
}

fn path_arg(cli_args: &HashMap<String, String>, key: &str, default: &str) -> PathBuf {
    PathBuf::from(cli_args.get(key).map(String::as_str).unwrap_or(default))
}
