//! Release stage: route cutover and release health

pub mod releaser;
pub mod routes;

pub use releaser::Releaser;
pub use routes::{ReconciledRoute, RouteReconciler};
