//! cfdeploy Library
//!
//! Deploy, release, status and destroy stages for applications running on
//! Cloud Foundry, driven through the Cloud Controller v3 API.

pub mod app;
pub mod config;
pub mod controller;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod health;
pub mod http;
pub mod logs;
pub mod models;
pub mod release;
pub mod terminal;
pub mod utils;
