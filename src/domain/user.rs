//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Persisted user record.
///
/// `password` always holds the stored hash. `revision` is an internal marker
/// bumped by every update and is never part of the public shape.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Don't expose the hash in debug output
impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("revision", &self.revision)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating a user. `password` is plaintext until the pre-persist
/// hook replaces it.
#[derive(Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "email must not be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Change set for an update. `None` means the field is not part of the change.
#[derive(Clone, Default, Validate)]
pub struct UserChanges {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "email must not be empty"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: Option<String>,
}

impl UserChanges {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// True when no field is part of the change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

impl std::fmt::Debug for UserChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserChanges")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Access to the password slot of an in-flight write.
pub trait PendingPassword {
    /// The password of this write, if the write carries one.
    fn password_mut(&mut self) -> Option<&mut String>;
}

impl PendingPassword for NewUser {
    fn password_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.password)
    }
}

impl PendingPassword for UserChanges {
    fn password_mut(&mut self) -> Option<&mut String> {
        self.password.as_mut()
    }
}

/// Public shape of a user (safe to return to clients).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Project a record onto its public shape.
pub fn to_public(record: &UserRecord) -> PublicUser {
    PublicUser {
        id: record.id.to_string(),
        name: record.name.clone(),
        email: record.email.clone(),
    }
}

impl From<&UserRecord> for PublicUser {
    fn from(record: &UserRecord) -> Self {
        to_public(record)
    }
}

impl From<UserRecord> for PublicUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            email: record.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password: "$2b$10$hash".to_string(),
            revision: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_shape_has_only_id_name_email() {
        let record = record();
        let json = serde_json::to_value(to_public(&record)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": record.id.to_string(),
                "name": "Ann",
                "email": "ann@x.com",
            })
        );
    }

    #[test]
    fn test_to_public_leaves_record_untouched() {
        let record = record();
        let before = record.clone();
        let _ = to_public(&record);

        assert_eq!(record, before);
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", record());
        assert!(!debug.contains("$2b$"));

        let debug = format!("{:?}", NewUser::new("Ann", "ann@x.com", "secret1"));
        assert!(!debug.contains("secret1"));

        let debug = format!("{:?}", UserChanges::default().password("secret1"));
        assert!(!debug.contains("secret1"));
    }

    #[test]
    fn test_new_user_validation() {
        assert!(NewUser::new("Ann", "ann@x.com", "secret1").validate().is_ok());
        assert!(NewUser::new("", "ann@x.com", "secret1").validate().is_err());
        assert!(NewUser::new("Ann", "", "secret1").validate().is_err());
        assert!(NewUser::new("Ann", "ann@x.com", "").validate().is_err());
    }

    #[test]
    fn test_changes_validation_skips_absent_fields() {
        assert!(UserChanges::default().validate().is_ok());
        assert!(UserChanges::default().name("Annie").validate().is_ok());
        assert!(UserChanges::default().email("").validate().is_err());
    }

    #[test]
    fn test_pending_password() {
        let mut changes = UserChanges::default().name("Annie");
        assert!(changes.password_mut().is_none());
        assert!(!changes.is_empty());

        let mut new_user = NewUser::new("Ann", "ann@x.com", "secret1");
        assert_eq!(new_user.password_mut().map(|p| p.as_str()), Some("secret1"));
    }
}
