//! Configuration: settings file and controller target

pub mod settings;
pub mod target;
