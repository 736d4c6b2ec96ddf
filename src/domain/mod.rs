//! Domain layer - Core business entities and logic
//!
//! This module contains the user record, its input and output shapes, and
//! the password hashing primitives. Nothing here touches the database.

pub mod password;
pub mod user;

pub use password::{hash_password, verify_password, Argon2Hasher, BcryptHasher, PasswordHasher};
pub use user::{to_public, NewUser, PendingPassword, PublicUser, UserChanges, UserRecord};

#[cfg(any(test, feature = "test-utils"))]
pub use password::MockPasswordHasher;
