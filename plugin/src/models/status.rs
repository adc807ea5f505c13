//! Health status reports

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health, ordered best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    Ready,
    Alive,
    Partial,
    Down,
    Unknown,
}

impl Health {
    /// The worse of the two; ties keep `other`
    pub fn worst(self, other: Health) -> Health {
        if other >= self {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Health::Ready => "READY",
            Health::Alive => "ALIVE",
            Health::Partial => "PARTIAL",
            Health::Down => "DOWN",
            Health::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub health: Health,

    pub health_message: String,

    /// Whether the health was gathered from outside the platform's own view
    pub external: bool,
}

impl StatusReport {
    pub fn new(health: Health, health_message: impl Into<String>) -> Self {
        Self {
            health,
            health_message: health_message.into(),
            external: true,
        }
    }
}
