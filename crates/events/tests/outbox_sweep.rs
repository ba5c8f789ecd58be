//! Outbox processor against a real database with fake transports.

mod common;

use std::sync::Arc;

use common::*;
use educonnect_core::notification_kinds::{TOPIC_MATCH_PROPOSED, TOPIC_SESSION_CREATED};
use educonnect_core::status::OutboxStatus;
use educonnect_db::repositories::{MatchRepo, OutboxRepo};
use educonnect_events::{OutboxConfig, OutboxProcessor, OutboxRunSummary};
use serde_json::json;
use sqlx::PgPool;

fn processor(pool: &PgPool, transport: &Arc<RecordingTransport>) -> OutboxProcessor {
    OutboxProcessor::new(pool.clone(), notifier(transport), OutboxConfig::default())
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_topic_is_retired_without_delivery(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let id = OutboxRepo::enqueue(&pool, "tutor.onboarded", &json!({ "tutor_id": 1 }))
        .await
        .unwrap();

    let summary = processor(&pool, &transport).run_once().await.unwrap();

    assert_eq!(summary, OutboxRunSummary { processed: 1, sent: 1, failed: 0 });
    let event = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(event.status(), Some(OutboxStatus::Sent));
    assert!(transport.chat_recipients().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_payload_counts_an_attempt(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let id = OutboxRepo::enqueue(&pool, TOPIC_SESSION_CREATED, &json!({ "session": "nope" }))
        .await
        .unwrap();

    let summary = processor(&pool, &transport).run_once().await.unwrap();

    assert_eq!(summary.failed, 1);
    let event = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(event.status(), Some(OutboxStatus::Pending));
    assert_eq!(event.attempts, 1);
    assert!(event.last_error.unwrap().contains("Malformed payload"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_created_messages_both_participants(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let student = profile(&pool, "Awa Traoré", "student", None, Some("+22370000001")).await;
    let tutor = profile(&pool, "Moussa Keita", "tutor", None, Some("+22370000002")).await;
    let booked = book(&pool, student, tutor, in_minutes(120), true).await;

    let summary = processor(&pool, &transport).run_once().await.unwrap();

    assert_eq!(summary, OutboxRunSummary { processed: 1, sent: 1, failed: 0 });
    assert_eq!(
        transport.chat_recipients(),
        vec!["+22370000001".to_string(), "+22370000002".to_string()]
    );
    let chats = transport.chats.lock().unwrap().clone();
    assert!(chats.iter().all(|(_, body)| body.contains(&booked.session.meeting_link)));

    // Retired events are not selected again.
    let again = processor(&pool, &transport).run_once().await.unwrap();
    assert_eq!(again.processed, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_delivery_stops_at_attempt_cap(pool: PgPool) {
    let transport = RecordingTransport::rejecting(&["+22370000002"]);
    let student = profile(&pool, "Awa", "student", None, Some("+22370000001")).await;
    let tutor = profile(&pool, "Moussa", "tutor", None, Some("+22370000002")).await;
    book(&pool, student, tutor, in_minutes(120), true).await;
    let events = OutboxRepo::list_by_topic(&pool, TOPIC_SESSION_CREATED).await.unwrap();
    let id = events[0].id;

    let processor = processor(&pool, &transport);
    for _ in 0..5 {
        let summary = processor.run_once().await.unwrap();
        assert_eq!(summary, OutboxRunSummary { processed: 1, sent: 0, failed: 1 });
    }
    let exhausted = processor.run_once().await.unwrap();
    assert_eq!(exhausted.processed, 0);

    let event = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(event.attempts, 5);
    assert_eq!(event.status(), Some(OutboxStatus::Pending));
    assert!(event.last_error.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn match_proposed_without_phone_is_sent(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let student = profile(&pool, "Awa", "student", None, None).await;
    let tutor = profile(&pool, "Moussa", "tutor", None, None).await;
    let booked = book(&pool, student, tutor, in_minutes(120), true).await;
    let other_tutor = profile(&pool, "Fatou", "tutor", None, Some("+22370000009")).await;
    let proposed = MatchRepo::create_proposed(&pool, booked.request_id, other_tutor.id)
        .await
        .unwrap();

    OutboxRepo::enqueue(&pool, TOPIC_MATCH_PROPOSED, &json!({ "match_id": booked.match_id }))
        .await
        .unwrap();
    OutboxRepo::enqueue(&pool, TOPIC_MATCH_PROPOSED, &json!({ "match_id": proposed.id }))
        .await
        .unwrap();
    OutboxRepo::enqueue(&pool, TOPIC_MATCH_PROPOSED, &json!({ "match_id": 999_999 }))
        .await
        .unwrap();

    let summary = processor(&pool, &transport).run_once().await.unwrap();

    // session.created plus three match.proposed events, all retired.
    assert_eq!(summary, OutboxRunSummary { processed: 4, sent: 4, failed: 0 });
    assert_eq!(transport.chat_recipients(), vec!["+22370000009".to_string()]);
    let chats = transport.chats.lock().unwrap().clone();
    assert!(chats[0].1.contains("Nouvelle demande : Mathématiques"));
    assert!(chats[0].1.contains("wed:evening"));
}
