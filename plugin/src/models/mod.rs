//! Domain models shared between the host and the plugin stages

pub mod deployment;
pub mod image;
pub mod status;

pub use deployment::{Deployment, Release};
pub use image::ImageRef;
pub use status::{Health, StatusReport};
