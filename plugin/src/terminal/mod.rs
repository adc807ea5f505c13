//! Step-based progress reporting
//!
//! Each remote action is shown as a step which is either completed or
//! aborted. The console reporter writes to stderr so record output on
//! stdout stays machine readable.

use std::future::Future;

use colored::*;

use crate::errors::PluginError;

/// Source of progress steps
pub trait Steps: Send + Sync {
    fn add(&self, description: &str) -> Box<dyn Step>;
}

/// A single in-flight step
pub trait Step: Send {
    fn update(&mut self, description: &str);

    fn done(self: Box<Self>);

    fn abort(self: Box<Self>);
}

/// Run `fut` inside a step, completing or aborting it by outcome
pub async fn run_step<T, F>(steps: &dyn Steps, description: &str, fut: F) -> Result<T, PluginError>
where
    F: Future<Output = Result<T, PluginError>>,
{
    let step = steps.add(description);
    match fut.await {
        Ok(value) => {
            step.done();
            Ok(value)
        }
        Err(e) => {
            step.abort();
            Err(e)
        }
    }
}

/// Human-facing reporter
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSteps;

impl Steps for ConsoleSteps {
    fn add(&self, description: &str) -> Box<dyn Step> {
        eprintln!("{} {}", "•".blue(), description);
        Box::new(ConsoleStep {
            description: description.to_string(),
        })
    }
}

struct ConsoleStep {
    description: String,
}

impl Step for ConsoleStep {
    fn update(&mut self, description: &str) {
        if self.description != description {
            eprintln!("  {}", description.dimmed());
            self.description = description.to_string();
        }
    }

    fn done(self: Box<Self>) {
        eprintln!("{} {}", "✓".green(), self.description);
    }

    fn abort(self: Box<Self>) {
        eprintln!("{} {}", "✗".red(), self.description);
    }
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSteps;

impl Steps for NoopSteps {
    fn add(&self, _description: &str) -> Box<dyn Step> {
        Box::new(NoopStep)
    }
}

struct NoopStep;

impl Step for NoopStep {
    fn update(&mut self, _description: &str) {}

    fn done(self: Box<Self>) {}

    fn abort(self: Box<Self>) {}
}
