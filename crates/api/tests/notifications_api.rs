//! Notification centre endpoints.

mod common;

use axum::http::StatusCode;
use common::*;
use educonnect_core::types::DbId;
use educonnect_db::models::notification::CreateNotification;
use educonnect_db::repositories::NotificationRepo;
use serde_json::json;
use sqlx::PgPool;

async fn notify(pool: &PgPool, user_id: DbId, title: &str) -> DbId {
    NotificationRepo::create(
        pool,
        &CreateNotification {
            user_id,
            kind: "session_created_student".to_string(),
            title: title.to_string(),
            body: None,
            session_id: None,
            meta: json!({}),
            delivered: true,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_returns_only_the_callers_notifications(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let awa = student(&pool, "Awa", None).await;
    let binta = student(&pool, "Binta", None).await;
    notify(&pool, awa, "Première").await;
    notify(&pool, awa, "Deuxième").await;
    notify(&pool, binta, "Autre").await;

    let response = get_auth(&app, "/api/v1/notifications", &token(awa, "student")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|n| n["user_id"] == awa));
    // Newest first among unseen rows.
    assert_eq!(rows[0]["title"], "Deuxième");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_requires_authentication(pool: PgPool) {
    let app = build_test_app(pool.clone());

    let response = get(&app, "/api/v1/notifications").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reading_a_notification_lowers_the_unread_count(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let awa = student(&pool, "Awa", None).await;
    let first = notify(&pool, awa, "Première").await;
    notify(&pool, awa, "Deuxième").await;
    let awa_token = token(awa, "student");

    let response = get_auth(&app, "/api/v1/notifications/unread-count", &awa_token).await;
    assert_eq!(body_json(response).await["data"]["count"], 2);

    let response = post_json_auth(
        &app,
        &format!("/api/v1/notifications/{first}/read"),
        json!({}),
        &awa_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(&app, "/api/v1/notifications/unread-count", &awa_token).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cannot_read_someone_elses_notification(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let awa = student(&pool, "Awa", None).await;
    let binta = student(&pool, "Binta", None).await;
    let theirs = notify(&pool, binta, "Autre").await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/notifications/{theirs}/read"),
        json!({}),
        &token(awa, "student"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response =
        get_auth(&app, "/api/v1/notifications/unread-count", &token(binta, "student")).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_seen_counts_only_owned_unseen_rows(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let awa = student(&pool, "Awa", None).await;
    let binta = student(&pool, "Binta", None).await;
    let first = notify(&pool, awa, "Première").await;
    let second = notify(&pool, awa, "Deuxième").await;
    let theirs = notify(&pool, binta, "Autre").await;
    let awa_token = token(awa, "student");

    let response = post_json_auth(
        &app,
        "/api/v1/notifications/seen",
        json!({ "ids": [first, second, theirs] }),
        &awa_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["marked_seen"], 2);

    // Already seen rows are not counted again.
    let response = post_json_auth(
        &app,
        "/api/v1/notifications/seen",
        json!({ "ids": [first] }),
        &awa_token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["marked_seen"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_seen_requires_ids(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let awa = student(&pool, "Awa", None).await;

    let response = post_json_auth(
        &app,
        "/api/v1/notifications/seen",
        json!({ "ids": [] }),
        &token(awa, "student"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
