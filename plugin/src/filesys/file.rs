//! File operations for configuration and stage records

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::PluginError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, PluginError> {
        fs::read_to_string(&self.path).await.map_err(|e| {
            PluginError::ConfigError(format!("unable to read {}: {}", self.path.display(), e))
        })
    }

    /// Read file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        let contents = self.read_string().await?;
        serde_json::from_str(&contents).map_err(|e| {
            PluginError::ConfigError(format!("invalid JSON in {}: {}", self.path.display(), e))
        })
    }

    /// Write JSON through a temporary file renamed into place
    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), PluginError> {
        let contents = serde_json::to_vec_pretty(value)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}
