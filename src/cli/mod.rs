//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `migrate` - Database migrations
//! - `user` - Create, update, show and verify user records

pub mod args;

pub use args::{Cli, Commands};
