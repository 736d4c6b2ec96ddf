//! User repository - the document store behind the user service.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, UserChanges, UserRecord};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Writes store the values they receive as-is; password hashing happens in
/// the service before a write reaches the repository.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Count records with this email, optionally ignoring one record
    async fn count_by_email(&self, email: &str, exclude: Option<Uuid>) -> AppResult<u64>;

    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Insert a new user; the store assigns the ID
    async fn insert(&self, user: NewUser) -> AppResult<UserRecord>;

    /// Apply a change set; only fields present in `changes` are written
    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<UserRecord>;
}

/// SeaORM-backed implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn count_by_email(&self, email: &str, exclude: Option<Uuid>) -> AppResult<u64> {
        let mut query = UserEntity::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(UserRecord::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(UserRecord::from))
    }

    async fn insert(&self, user: NewUser) -> AppResult<UserRecord> {
        let now = Utc::now();
        let email = user.email.clone();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(user.name),
            email: Set(user.email),
            password: Set(user.password),
            revision: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_write(e, email))?;
        Ok(UserRecord::from(model))
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<UserRecord> {
        let email = changes.email.clone();

        // revision = revision + 1, evaluated by the store
        let mut query = UserEntity::update_many()
            .col_expr(
                user::Column::Revision,
                Expr::col(user::Column::Revision).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(name) = changes.name {
            query = query.col_expr(user::Column::Name, Expr::value(name));
        }
        if let Some(email) = changes.email {
            query = query.col_expr(user::Column::Email, Expr::value(email));
        }
        if let Some(password) = changes.password {
            query = query.col_expr(user::Column::Password, Expr::value(password));
        }

        let result = query
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| match email {
                Some(email) => AppError::from_write(e, email),
                None => AppError::from(e),
            })?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        self.find_by_id(id).await?.ok_or_not_found()
    }
}
