//! User record service - uniqueness check, password hashing, persistence.
//!
//! Every save runs, in order: input validation, the email uniqueness check,
//! the pre-persist hook, then the repository write. A save whose password
//! cannot be hashed never reaches the repository.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{NewUser, PasswordHasher, PendingPassword, UserChanges, UserRecord};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UserRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User record service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRecordService: Send + Sync {
    /// True when no stored record uses `email`.
    ///
    /// Point-in-time read; the unique index on `users.email` is what actually
    /// rejects a concurrent duplicate.
    async fn validate_unique_email(&self, email: &str) -> AppResult<bool>;

    /// Create a user, hashing its password before the write
    async fn create_user(&self, input: NewUser) -> AppResult<UserRecord>;

    /// Apply a change set; the password is rehashed only if it is part of it
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<UserRecord>;

    /// Get user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<UserRecord>;

    /// Get user by email
    async fn get_user_by_email(&self, email: &str) -> AppResult<UserRecord>;

    /// Check a candidate password for the user with this email.
    /// Unknown emails never match.
    async fn verify_user_password(&self, email: &str, plain_text: &str) -> AppResult<bool>;
}

/// Concrete implementation of UserRecordService.
pub struct UserRecords {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserRecords {
    /// Create new service instance with its store and hashing primitive
    pub fn new(repo: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repo, hasher }
    }

    /// Pre-persist hook: replace an in-flight plaintext password with its hash.
    ///
    /// Writes without a password are left alone. On failure the slot is
    /// emptied and the error returned, so the caller must abort the write.
    pub async fn before_save<W>(&self, write: &mut W) -> AppResult<()>
    where
        W: PendingPassword + Send,
    {
        let slot = match write.password_mut() {
            Some(slot) if !slot.is_empty() => slot,
            _ => return Ok(()),
        };

        let plain_text = std::mem::take(slot);
        let hasher = Arc::clone(&self.hasher);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&plain_text))
            .await
            .map_err(|e| AppError::internal(format!("hashing task failed: {}", e)))??;

        *slot = hashed;
        Ok(())
    }
}

#[async_trait]
impl UserRecordService for UserRecords {
    async fn validate_unique_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.repo.count_by_email(email, None).await? == 0)
    }

    async fn create_user(&self, mut input: NewUser) -> AppResult<UserRecord> {
        input.validate()?;

        if !self.validate_unique_email(&input.email).await? {
            tracing::warn!(email = %input.email, "Email already registered");
            return Err(AppError::duplicate_email(input.email));
        }

        let name = input.name.clone();
        self.before_save(&mut input).await.map_err(|e| {
            tracing::error!(user = %name, error = %e, "Error hashing the password for the user");
            e
        })?;

        let user = self.repo.insert(input).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, mut changes: UserChanges) -> AppResult<UserRecord> {
        changes.validate()?;

        if changes.is_empty() {
            return self.get_user(id).await;
        }

        if let Some(email) = changes.email.as_deref() {
            if self.repo.count_by_email(email, Some(id)).await? > 0 {
                tracing::warn!(user_id = %id, email = %email, "Email already registered");
                return Err(AppError::duplicate_email(email));
            }
        }

        self.before_save(&mut changes).await.map_err(|e| {
            tracing::error!(user_id = %id, error = %e, "Error hashing the password for the user");
            e
        })?;

        let user = self.repo.update(id, changes).await?;
        tracing::info!(user_id = %user.id, revision = user.revision, "User updated");
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<UserRecord> {
        self.repo.find_by_id(id).await?.ok_or_not_found()
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<UserRecord> {
        self.repo.find_by_email(email).await?.ok_or_not_found()
    }

    async fn verify_user_password(&self, email: &str, plain_text: &str) -> AppResult<bool> {
        let Some(user) = self.repo.find_by_email(email).await? else {
            return Ok(false);
        };

        let hasher = Arc::clone(&self.hasher);
        let plain_text = plain_text.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&plain_text, &user.password))
            .await
            .map_err(|e| AppError::internal(format!("verification task failed: {}", e)))
    }
}
