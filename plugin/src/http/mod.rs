//! Cloud Controller HTTP client and per-resource endpoints

pub mod apps;
pub mod client;
pub mod processes;
pub mod routes;
pub mod services;
pub mod staging;
pub mod tenancy;

pub use client::HttpClient;
