//! klog-report CLI library.
//!
//! This crate provides the command-line interface: argument parsing,
//! configuration, klog invocation and the report commands.

mod cli;
pub mod commands;
mod config;
pub mod source;

pub use cli::{Cli, Commands};
pub use config::Config;
