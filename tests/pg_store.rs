use std::sync::Arc;

use chrono::Utc;
use directory_api::auth::AuthUser;
use directory_api::auth::responses::RegisterRequest;
use directory_api::directory::{
    DirectoryError, DirectoryStore, PgDirectoryStore, StoreError,
};
use directory_api::models::{AddMemberRequest, Organisation, User};
use directory_api::test_support::{TestDatabase, TestDatabaseError, TestDirectory};
use uuid::Uuid;

async fn database() -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping postgres store test: no container runtime ({err})");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

fn user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: "Pat".into(),
        last_name: "Postgres".into(),
        email: email.into(),
        password_hash: "$argon2id$placeholder".into(),
        phone: None,
        created_at: Utc::now(),
    }
}

fn org(name: &str) -> Organisation {
    Organisation {
        id: Uuid::new_v4(),
        name: name.into(),
        description: Some("desc".into()),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn unique_email_violation_rolls_back_the_whole_registration() {
    let Some(test_db) = database().await else {
        return;
    };
    let store = PgDirectoryStore::new(test_db.pool_clone());

    store
        .create_user(&user("pat@x.com"), &org("Pat's Organisation"))
        .await
        .expect("first insert");

    let err = store
        .create_user(&user("pat@x.com"), &org("Other"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Conflict { ref constraint } if constraint == "users_email_key"),
        "unexpected error: {err:?}"
    );

    let orgs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organisations")
        .fetch_one(store.pool())
        .await
        .expect("count");
    assert_eq!(orgs, 1, "default organisation of the rejected user must not persist");

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn membership_queries_match_the_in_memory_store() {
    let Some(test_db) = database().await else {
        return;
    };
    let store = PgDirectoryStore::new(test_db.pool_clone());
    let (owner, guest) = (user("owner@x.com"), user("guest@x.com"));
    let owned = org("Owner's Organisation");
    store.create_user(&owner, &owned).await.expect("owner");
    store.create_user(&guest, &org("Guest's Organisation")).await.expect("guest");

    assert!(store.is_member(owned.id, owner.id).await.unwrap());
    assert!(!store.shares_organisation(owner.id, guest.id).await.unwrap());
    assert!(store.append_member(owned.id, guest.id).await.unwrap());
    assert!(!store.append_member(owned.id, guest.id).await.unwrap());
    assert!(store.shares_organisation(guest.id, owner.id).await.unwrap());

    let listed = store.list_organisations_for(guest.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    let found = store
        .find_organisation_by_id(owned.id)
        .await
        .unwrap()
        .expect("organisation");
    assert_eq!(found.name, "Owner's Organisation");
    assert!(store.find_user_by_email("OWNER@x.com").await.unwrap().is_none());
    store.ping().await.expect("ping");

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn directory_service_runs_against_postgres() {
    let Some(test_db) = database().await else {
        return;
    };
    let directory = TestDirectory::with_store(Arc::new(PgDirectoryStore::new(test_db.pool_clone())));
    let service = &directory.service;

    let request = |first: &str, email: &str| RegisterRequest {
        first_name: Some(first.into()),
        last_name: Some("Doe".into()),
        email: Some(email.into()),
        password: Some("password123".into()),
        phone: None,
    };

    let john = service.register(&request("John", "john@x.com")).await.expect("john");
    let jane = service.register(&request("Jane", "jane@x.com")).await.expect("jane");
    assert!(matches!(
        service.register(&request("Again", "john@x.com")).await,
        Err(DirectoryError::DuplicateEmail)
    ));

    let john_caller = AuthUser {
        id: john.user.user_id,
        email: john.user.email.clone(),
    };
    let jane_caller = AuthUser {
        id: jane.user.user_id,
        email: jane.user.email.clone(),
    };
    let org_id = service.list_organisations(&john_caller).await.unwrap()[0].org_id;

    assert!(matches!(
        service.get_organisation(&jane_caller, org_id).await,
        Err(DirectoryError::Forbidden)
    ));
    service
        .add_member(
            &john_caller,
            org_id,
            &AddMemberRequest {
                user_id: Some(jane.user.user_id.to_string()),
            },
        )
        .await
        .expect("add jane");
    assert_eq!(
        service.get_organisation(&jane_caller, org_id).await.unwrap().name,
        "John's Organisation"
    );

    test_db.close().await.expect("failed to drop test database");
}
