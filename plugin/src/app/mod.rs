//! Command line host: runs one lifecycle stage per invocation

pub mod options;
pub mod run;
