//! Argument parsing, logging setup and the subcommands.

pub mod commands;
pub mod config;
pub mod telemetry;
