//! User record service integration tests against an in-memory SQLite store.

use std::sync::Arc;

use uuid::Uuid;

use user_records::config::DatabaseConfig;
use user_records::domain::{to_public, verify_password, BcryptHasher, NewUser, UserChanges};
use user_records::errors::AppError;
use user_records::infra::{Database, UserRepository, UserStore};
use user_records::services::{UserRecordService, UserRecords};

async fn setup() -> (UserRecords, Arc<UserStore>) {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let db = Database::connect(&config).await.unwrap();
    let store = Arc::new(UserStore::new(db.get_connection()));
    let service = UserRecords::new(store.clone(), Arc::new(BcryptHasher::new(4)));
    (service, store)
}

fn ann() -> NewUser {
    NewUser::new("Ann", "ann@x.com", "secret1")
}

#[tokio::test]
async fn test_create_user_stores_hash() {
    let (service, _) = setup().await;

    let user = service.create_user(ann()).await.unwrap();
    let stored = service.get_user(user.id).await.unwrap();

    assert_eq!(stored.name, "Ann");
    assert_eq!(stored.email, "ann@x.com");
    assert_ne!(stored.password, "secret1");
    assert!(verify_password("secret1", &stored.password));
    assert_eq!(stored.revision, 0);
}

#[tokio::test]
async fn test_second_user_with_same_email_is_rejected() {
    let (service, store) = setup().await;

    service.create_user(ann()).await.unwrap();
    let result = service
        .create_user(NewUser::new("Other Ann", "ann@x.com", "secret2"))
        .await;

    assert!(matches!(result, Err(AppError::DuplicateEmail(_))));
    assert_eq!(store.count_by_email("ann@x.com", None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unique_index_rejects_writes_that_skip_the_check() {
    let (_, store) = setup().await;

    store.insert(ann()).await.unwrap();
    let result = store.insert(NewUser::new("Ann 2", "ann@x.com", "x")).await;

    assert!(matches!(result, Err(AppError::DuplicateEmail(email)) if email == "ann@x.com"));
    assert_eq!(store.count_by_email("ann@x.com", None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_rename_keeps_password_hash() {
    let (service, _) = setup().await;

    let created = service.create_user(ann()).await.unwrap();
    let renamed = service
        .update_user(created.id, UserChanges::default().name("Annie"))
        .await
        .unwrap();

    assert_eq!(renamed.name, "Annie");
    assert_eq!(renamed.password, created.password);
    assert_eq!(renamed.revision, created.revision + 1);

    let stored = service.get_user(created.id).await.unwrap();
    assert_eq!(stored.password, created.password);
}

#[tokio::test]
async fn test_concurrent_updates_each_bump_revision() {
    let (service, _) = setup().await;
    let service = Arc::new(service);

    let id = service.create_user(ann()).await.unwrap().id;
    let mut handles = Vec::new();
    for i in 0..10 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .update_user(id, UserChanges::default().name(format!("Ann {}", i)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = service.get_user(id).await.unwrap();
    assert_eq!(stored.revision, 10);
}

#[tokio::test]
async fn test_password_change_is_rehashed() {
    let (service, _) = setup().await;

    let created = service.create_user(ann()).await.unwrap();
    let updated = service
        .update_user(created.id, UserChanges::default().password("secret2"))
        .await
        .unwrap();

    assert_ne!(updated.password, created.password);
    assert_ne!(updated.password, "secret2");
    assert!(service.verify_user_password("ann@x.com", "secret2").await.unwrap());
    assert!(!service.verify_user_password("ann@x.com", "secret1").await.unwrap());
}

#[tokio::test]
async fn test_keeping_own_email_is_not_a_duplicate() {
    let (service, _) = setup().await;

    let created = service.create_user(ann()).await.unwrap();
    let updated = service
        .update_user(created.id, UserChanges::default().email("ann@x.com").name("Annie"))
        .await
        .unwrap();

    assert_eq!(updated.email, "ann@x.com");
}

#[tokio::test]
async fn test_email_change_to_taken_address_is_rejected() {
    let (service, _) = setup().await;

    service.create_user(ann()).await.unwrap();
    let bob = service
        .create_user(NewUser::new("Bob", "bob@x.com", "hunter2"))
        .await
        .unwrap();

    let result = service
        .update_user(bob.id, UserChanges::default().email("ann@x.com"))
        .await;

    assert!(matches!(result, Err(AppError::DuplicateEmail(_))));
    assert_eq!(service.get_user(bob.id).await.unwrap().email, "bob@x.com");
}

#[tokio::test]
async fn test_failed_hash_writes_nothing() {
    let (_, store) = setup().await;
    let service = UserRecords::new(store.clone(), Arc::new(BcryptHasher::new(3)));

    let result = service.create_user(ann()).await;

    assert!(matches!(result, Err(AppError::Hashing(_))));
    assert_eq!(store.count_by_email("ann@x.com", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_password_longer_than_bcrypt_limit_is_rejected() {
    let (service, store) = setup().await;
    let long = format!("{}X", "a".repeat(72));

    let result = service
        .create_user(NewUser::new("Ann", "ann@x.com", long))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(store.count_by_email("ann@x.com", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_unknown_user_is_not_found() {
    let (service, _) = setup().await;

    let result = service
        .update_user(Uuid::new_v4(), UserChanges::default().name("Nobody"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_public_view_of_stored_user() {
    let (service, _) = setup().await;

    let user = service.create_user(ann()).await.unwrap();
    let json = serde_json::to_value(to_public(&user)).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "id": user.id.to_string(),
            "name": "Ann",
            "email": "ann@x.com",
        })
    );
}

#[tokio::test]
async fn test_validate_unique_email() {
    let (service, _) = setup().await;

    assert!(service.validate_unique_email("ann@x.com").await.unwrap());
    service.create_user(ann()).await.unwrap();
    assert!(!service.validate_unique_email("ann@x.com").await.unwrap());
}

#[tokio::test]
async fn test_migration_status_lists_users_table() {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let db = Database::connect(&config).await.unwrap();

    db.ping().await.unwrap();
    let status = db.migration_status().await.unwrap();

    assert_eq!(status.len(), 1);
    assert!(status[0].0.contains("create_users_table"));
    assert!(status[0].1);
}
