//! Command-line interface for ntuple-launcher.
//!
//! Provides commands for inspecting catalogs, planning tasks and submitting
//! them to the processing framework.

mod commands;

pub use commands::{load_config, parse_cli, run, run_with_cli, Cli, Commands, LaunchArgs};
