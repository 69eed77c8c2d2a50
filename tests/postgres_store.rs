use chrono::{Duration, DurationRound, Utc};
use secrecy::ExposeSecret;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

use chirpy::auth::{generate_refresh_token, hash_password};
use chirpy::configuration::{get_configuration, DatabaseSettings};
use chirpy::error::{AppError, DatabaseError};
use chirpy::store::{PgRefreshTokenStore, PgUserStore, RefreshTokenStore, RevokeOutcome, UserStore};

pub struct TestDb {
    pub pool: PgPool,
    pub user_id: Uuid,
    pub email: String,
}

async fn spawn_db() -> TestDb {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    let pool = configure_database(&configuration.database).await;

    let user_id = Uuid::new_v4();
    let email = format!("{}@example.com", user_id);
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO users (id, created_at, updated_at, email, hashed_password) VALUES ($1, $2, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(now)
    .bind(&email)
    .bind(hash_password("04234").expect("Failed to hash password"))
    .execute(&pool)
    .await
    .expect("Failed to seed user");

    TestDb {
        pool,
        user_id,
        email,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection =
        PgConnection::connect(config.connection_string_without_db().expose_secret())
            .await
            .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

// Postgres keeps microseconds
fn now_micros() -> chrono::DateTime<Utc> {
    Utc::now()
        .duration_trunc(Duration::microseconds(1))
        .expect("Failed to truncate timestamp")
}

#[tokio::test]
async fn user_store_finds_account_by_email() {
    let db = spawn_db().await;
    let users = PgUserStore::new(db.pool.clone());

    let found = users
        .find_by_email(&db.email)
        .await
        .unwrap()
        .expect("Seeded user not found");
    assert_eq!(found.id, db.user_id);
    assert!(found.hashed_password.starts_with("$2"));

    assert!(users
        .find_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn inserted_refresh_token_can_be_found() {
    let db = spawn_db().await;
    let store = PgRefreshTokenStore::new(db.pool.clone());
    let token = generate_refresh_token().unwrap();
    let created_at = now_micros();
    let expires_at = created_at + Duration::days(60);

    store
        .insert(&token, db.user_id, created_at, expires_at)
        .await
        .expect("Failed to insert refresh token");

    let record = store
        .find_by_token(&token)
        .await
        .unwrap()
        .expect("Refresh token not found");
    assert_eq!(record.token, token);
    assert_eq!(record.user_id, db.user_id);
    assert_eq!(record.created_at, created_at);
    assert_eq!(record.expires_at, expires_at);
    assert!(record.revoked_at.is_none());

    assert!(store
        .find_by_token(&generate_refresh_token().unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn mark_revoked_applies_once_and_keeps_first_timestamp() {
    let db = spawn_db().await;
    let store = PgRefreshTokenStore::new(db.pool.clone());
    let token = generate_refresh_token().unwrap();
    let created_at = now_micros();
    store
        .insert(&token, db.user_id, created_at, created_at + Duration::days(60))
        .await
        .unwrap();

    let first_revocation = created_at + Duration::hours(1);
    assert_eq!(
        store.mark_revoked(&token, first_revocation).await.unwrap(),
        RevokeOutcome::Applied
    );
    assert_eq!(
        store
            .mark_revoked(&token, first_revocation + Duration::hours(1))
            .await
            .unwrap(),
        RevokeOutcome::AlreadyRevoked
    );

    let record = store.find_by_token(&token).await.unwrap().unwrap();
    assert_eq!(record.revoked_at, Some(first_revocation));
}

#[tokio::test]
async fn mark_revoked_reports_unknown_token() {
    let db = spawn_db().await;
    let store = PgRefreshTokenStore::new(db.pool.clone());

    let outcome = store
        .mark_revoked(&generate_refresh_token().unwrap(), Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome, RevokeOutcome::NotFound);
}

#[tokio::test]
async fn concurrent_revokes_apply_exactly_once() {
    let db = spawn_db().await;
    let store = PgRefreshTokenStore::new(db.pool.clone());
    let token = generate_refresh_token().unwrap();
    let now = now_micros();
    store
        .insert(&token, db.user_id, now, now + Duration::days(60))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let token = token.clone();
            tokio::spawn(async move {
                store
                    .mark_revoked(&token, now + Duration::seconds(i))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            RevokeOutcome::Applied => applied += 1,
            RevokeOutcome::AlreadyRevoked => {}
            RevokeOutcome::NotFound => panic!("Inserted token reported as not found"),
        }
    }
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn duplicate_token_insert_is_a_unique_violation() {
    let db = spawn_db().await;
    let store = PgRefreshTokenStore::new(db.pool.clone());
    let token = generate_refresh_token().unwrap();
    let now = Utc::now();

    store
        .insert(&token, db.user_id, now, now + Duration::days(60))
        .await
        .unwrap();
    let result = store
        .insert(&token, db.user_id, now, now + Duration::days(60))
        .await;

    assert!(matches!(
        result,
        Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
    ));
}
