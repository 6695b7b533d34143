//! Subcommand implementations.

pub mod content;
pub mod user;
