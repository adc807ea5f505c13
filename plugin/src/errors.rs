//! Error types for the plugin

use thiserror::Error;

/// Main error type for the plugin
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-2xx answer from the Cloud Controller
    #[error("Cloud Controller returned {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Malformed user input, raised before any remote mutation
    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A lookup that must match exactly one resource matched several
    #[error("ambiguous: {0}")]
    Ambiguous(String),

    #[error("staging build failed: {0}")]
    StagingFailed(String),

    #[error("deployment failed: process crashed, {0}")]
    ProcessCrashed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Failure of one pipeline step, carrying the step's context
    #[error("{context}: {source}")]
    Step {
        context: String,
        #[source]
        source: Box<PluginError>,
    },
}

impl PluginError {
    /// Wrap the error with the context of the step that failed
    pub fn context(self, context: impl Into<String>) -> Self {
        PluginError::Step {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping step context
    pub fn root(&self) -> &PluginError {
        match self {
            PluginError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the controller reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            PluginError::NotFound(_) => true,
            PluginError::ApiError { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// Attach step context to a `Result`
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, PluginError>;
}

impl<T> ResultExt<T> for Result<T, PluginError> {
    fn context(self, context: impl Into<String>) -> Result<T, PluginError> {
        self.map_err(|e| e.context(context))
    }
}
