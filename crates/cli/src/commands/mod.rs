//! CLI subcommand implementations

pub mod batch;
pub mod predict;
pub mod remote;
