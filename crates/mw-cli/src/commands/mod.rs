//! CLI subcommand implementations.

pub mod load_manifest;
pub mod reset;
pub mod run;
pub mod status;
pub mod upcoming;
pub mod util;
