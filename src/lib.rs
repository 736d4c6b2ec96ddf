//! User Records - user persistence with unique emails and hashed passwords.
//!
//! Every write of a user goes through [`services::UserRecords`], which checks
//! email uniqueness, hashes the password in a pre-persist hook and only then
//! hands the record to the store. The store carries a unique index on
//! `email` as the final guard.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: User record, public shape and password hashing
//! - **services**: The user record service
//! - **infra**: Database, migrations and the user repository
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Create a user
//! cargo run -- user create --name Ann --email ann@x.com --password secret1
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::{to_public, NewUser, PublicUser, UserChanges, UserRecord};
pub use errors::{AppError, AppResult};
pub use services::{UserRecordService, UserRecords};
