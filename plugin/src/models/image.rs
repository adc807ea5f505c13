//! Container image reference produced by the build stage

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PluginError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub image: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
        }
    }

    /// `image:tag`, as handed to the controller
    pub fn reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.image, self.tag)
    }
}

impl FromStr for ImageRef {
    type Err = PluginError;

    /// Parses `registry/name[:tag]`; a colon inside the registry host is
    /// not a tag separator. The tag defaults to `latest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PluginError::Validation("image reference is empty".to_string()));
        }

        let name_start = s.rfind('/').map(|i| i + 1).unwrap_or(0);
        match s[name_start..].rfind(':') {
            Some(i) => {
                let split = name_start + i;
                let (image, tag) = (&s[..split], &s[split + 1..]);
                if image.is_empty() || tag.is_empty() {
                    return Err(PluginError::Validation(format!("invalid image reference: {}", s)));
                }
                Ok(Self::new(image, tag))
            }
            None => Ok(Self::new(s, "latest")),
        }
    }
}
