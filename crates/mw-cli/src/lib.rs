//! Milestone watcher CLI library.
//!
//! This crate provides the CLI interface and the notification channel.

mod cli;
pub mod commands;
mod config;
pub mod notify;

pub use cli::{Cli, Commands};
pub use config::Config;
