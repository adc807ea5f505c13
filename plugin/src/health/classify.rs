//! Instance state classification

use std::collections::BTreeMap;
use std::fmt;

use cf_api::InstanceState;

use crate::models::{Health, StatusReport};

/// Number of instances per state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceCounts {
    counts: BTreeMap<InstanceState, usize>,
    total: usize,
}

impl InstanceCounts {
    pub fn add(&mut self, state: InstanceState) {
        *self.counts.entry(state).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn get(&self, state: InstanceState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Every instance is in `state`; false when there are no instances
    pub fn all(&self, state: InstanceState) -> bool {
        self.total > 0 && self.get(state) == self.total
    }
}

impl Extend<InstanceState> for InstanceCounts {
    fn extend<I: IntoIterator<Item = InstanceState>>(&mut self, iter: I) {
        for state in iter {
            self.add(state);
        }
    }
}

impl fmt::Display for InstanceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (state, count)) in self.counts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", state, count)?;
        }
        f.write_str("}")
    }
}

/// Classify one application's instances
///
/// No instances at all is reported as mixed.
pub fn classify(counts: &InstanceCounts) -> StatusReport {
    if counts.all(InstanceState::Running) {
        StatusReport::new(Health::Ready, "all processes are reporting ready")
    } else if counts.all(InstanceState::Crashed) {
        StatusReport::new(Health::Down, "all processes are crashed")
    } else if counts.all(InstanceState::Starting) {
        StatusReport::new(Health::Alive, "all processes are starting")
    } else if counts.all(InstanceState::Down) {
        StatusReport::new(Health::Down, "all processes are reporting down")
    } else {
        StatusReport::new(
            Health::Partial,
            format!("all processes are reporting mixed status: {}", counts),
        )
    }
}
