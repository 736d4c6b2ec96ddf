//! User command - create, update, show and verify user records.

use std::sync::Arc;

use crate::cli::args::{UserAction, UserArgs, UserLookup};
use crate::config::Config;
use crate::domain::{NewUser, PublicUser, UserChanges};
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, UserStore};
use crate::services::{UserRecordService, UserRecords};

/// Execute the user command
pub async fn execute(args: UserArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config.database).await?;
    let service = UserRecords::new(
        Arc::new(UserStore::new(db.get_connection())),
        config.hasher(),
    );

    run(&service, args.action).await
}

/// Dispatch a user action against any service implementation.
pub async fn run(service: &dyn UserRecordService, action: UserAction) -> AppResult<()> {
    match action {
        UserAction::Create {
            name,
            email,
            password,
        } => {
            let user = service
                .create_user(NewUser::new(name, email, password))
                .await?;
            print_public(&PublicUser::from(user))
        }
        UserAction::Update {
            id,
            name,
            email,
            password,
        } => {
            let changes = UserChanges {
                name,
                email,
                password,
            };
            let user = service.update_user(id, changes).await?;
            print_public(&PublicUser::from(user))
        }
        UserAction::Show(UserLookup { id, email }) => {
            let user = match (id, email) {
                (Some(id), _) => service.get_user(id).await?,
                (None, Some(email)) => service.get_user_by_email(&email).await?,
                (None, None) => return Err(AppError::validation("either --id or --email is required")),
            };
            print_public(&PublicUser::from(user))
        }
        UserAction::Verify { email, password } => {
            let matches = service.verify_user_password(&email, &password).await?;
            println!("{}", if matches { "match" } else { "no match" });
            if matches {
                Ok(())
            } else {
                Err(AppError::validation("password does not match"))
            }
        }
    }
}

fn print_public(user: &PublicUser) -> AppResult<()> {
    let json = serde_json::to_string_pretty(user)
        .map_err(|e| AppError::internal(format!("serialize user: {}", e)))?;
    println!("{}", json);
    Ok(())
}
