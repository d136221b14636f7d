//! Integration tests for the user repository.

use chrono::{Duration, Utc};
use openerr_db::models::user::CreateUser;
use openerr_db::repositories::UserRepo;
use sqlx::PgPool;

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_find_user(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("dev@example.com"))
        .await
        .unwrap();
    assert!(user.is_active);
    assert_eq!(user.failed_login_count, 0);
    assert!(user.otp_code_hash.is_none());

    let by_email = UserRepo::find_by_email(&pool, "dev@example.com")
        .await
        .unwrap()
        .expect("user should be found by email");
    assert_eq!(by_email.id, user.id);

    let by_id = UserRepo::find_by_id(&pool, user.id).await.unwrap();
    assert!(by_id.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_email_violates_unique_constraint(pool: PgPool) {
    UserRepo::create(&pool, &new_user("dup@example.com"))
        .await
        .unwrap();

    let err = UserRepo::create(&pool, &new_user("dup@example.com"))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_users_email"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_logins_and_reset(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("lock@example.com"))
        .await
        .unwrap();

    assert_eq!(UserRepo::increment_failed_login(&pool, user.id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, user.id).await.unwrap(), 2);

    let until = Utc::now() + Duration::minutes(15);
    UserRepo::lock_account(&pool, user.id, until).await.unwrap();
    let locked = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(locked.locked_until.is_some());

    UserRepo::record_successful_login(&pool, user.id).await.unwrap();
    let reset = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(reset.failed_login_count, 0);
    assert!(reset.locked_until.is_none());
    assert!(reset.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_otp_set_and_clear(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("otp@example.com"))
        .await
        .unwrap();

    let expires = Utc::now() + Duration::minutes(5);
    UserRepo::set_otp(&pool, user.id, "hash-1", expires).await.unwrap();
    UserRepo::set_otp(&pool, user.id, "hash-2", expires).await.unwrap();

    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.otp_code_hash.as_deref(), Some("hash-2"));
    assert!(stored.otp_expires_at.is_some());

    assert!(UserRepo::clear_otp(&pool, user.id).await.unwrap());
    assert!(
        !UserRepo::clear_otp(&pool, user.id).await.unwrap(),
        "second clear should report nothing to clear"
    );
    let cleared = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(cleared.otp_code_hash.is_none());
    assert!(cleared.otp_expires_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_otp_is_consumed_once(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("consume@example.com"))
        .await
        .unwrap();
    UserRepo::set_otp(&pool, user.id, "hash-1", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    assert!(!UserRepo::consume_otp(&pool, user.id, "other-hash").await.unwrap());
    assert!(UserRepo::consume_otp(&pool, user.id, "hash-1").await.unwrap());
    assert!(
        !UserRepo::consume_otp(&pool, user.id, "hash-1").await.unwrap(),
        "a consumed code cannot be used again"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_consume_has_one_winner(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("race@example.com"))
        .await
        .unwrap();
    UserRepo::set_otp(&pool, user.id, "hash-race", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        UserRepo::consume_otp(&pool, user.id, "hash-race"),
        UserRepo::consume_otp(&pool, user.id, "hash-race"),
    );
    assert_eq!([a.unwrap(), b.unwrap()].iter().filter(|won| **won).count(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_otp_is_not_consumed(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("stale@example.com"))
        .await
        .unwrap();
    UserRepo::set_otp(&pool, user.id, "hash-old", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    assert!(!UserRepo::consume_otp(&pool, user.id, "hash-old").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lock_discards_outstanding_otp(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("locked-otp@example.com"))
        .await
        .unwrap();
    UserRepo::set_otp(&pool, user.id, "hash-1", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    UserRepo::lock_account(&pool, user.id, Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    let locked = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(locked.locked_until.is_some());
    assert!(locked.otp_code_hash.is_none());
    assert!(locked.otp_expires_at.is_none());
}
