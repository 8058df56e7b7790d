//! Command handlers.
//!
//! Each subcommand resolves the workspace, touches the store and the core
//! modules, and prints its result as JSON on stdout.
mod admin;
mod ai;
mod context;
mod project;
mod scenario;
mod system;

pub(crate) use admin::{run_init, run_reset};
pub(crate) use ai::run_ai;
pub(crate) use context::WorkbenchContext;
pub(crate) use project::run_project;
pub(crate) use scenario::run_scenario;
pub(crate) use system::run_system;
