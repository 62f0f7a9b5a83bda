//! Work log CLI library.
//!
//! This crate provides the `wl` command line interface on top of the
//! document engine in `wl-core` and the Jira client in `wl-jira`.

mod cli;
pub mod commands;
mod config;
pub mod logfile;
pub mod render;
pub mod summaries;

pub use cli::{Cli, Commands};
pub use config::Config;
