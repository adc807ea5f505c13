//! Cloud Controller v3 models
//!
//! Resource and request types exchanged with the Cloud Controller API.
//! No I/O lives here; the plugin crate owns the HTTP client.

pub mod models;

pub use models::*;
