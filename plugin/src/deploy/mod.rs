//! Deployment module

pub mod destroy;
pub mod env;
pub mod fsm;
pub mod orchestrator;
pub mod params;
pub mod wait;

pub use destroy::Destroyer;
pub use fsm::{DeployFsm, DeployPhase, DeploySettings};
pub use orchestrator::{DeployRequest, Orchestrator};
