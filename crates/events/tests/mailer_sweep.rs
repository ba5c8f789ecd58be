//! Notification mailer against a real database with a fake transport.

mod common;

use std::sync::Arc;

use common::*;
use educonnect_core::notification_kinds::{
    KIND_SESSION_CREATED_STUDENT, KIND_SESSION_CREATED_TUTOR,
};
use educonnect_db::repositories::NotificationRepo;
use educonnect_events::{MailerRunSummary, NotificationMailer};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn emails_undelivered_confirmations(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let student = profile(&pool, "Awa Traoré", "student", Some("awa@example.com"), None).await;
    let tutor = profile(&pool, "Moussa Keita", "tutor", Some("moussa@example.com"), None).await;
    let booked = book(&pool, student, tutor, in_minutes(120), false).await;

    let mailer = NotificationMailer::new(pool.clone(), notifier(&transport));
    let summary = mailer.run_once().await.unwrap();

    assert_eq!(summary, MailerRunSummary { processed: 2, sent: 2, skipped: 0 });
    let emails = transport.emails.lock().unwrap().clone();
    let student_mail = emails.iter().find(|m| m.to == "awa@example.com").unwrap();
    assert_eq!(student_mail.subject, "Ta session de soutien en Mathématiques est prête ✅");
    assert!(student_mail.text.contains(&booked.session.meeting_link));
    let tutor_mail = emails.iter().find(|m| m.to == "moussa@example.com").unwrap();
    assert_eq!(tutor_mail.subject, "Nouvelle session de soutien en Mathématiques 📚");

    let rows = NotificationRepo::list_for_session(&pool, booked.session.id).await.unwrap();
    assert!(rows.iter().all(|n| n.delivered && n.meta.get("email_sent_at").is_some()));

    let again = mailer.run_once().await.unwrap();
    assert_eq!(again.processed, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_email_is_recorded_and_capped(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let student = profile(&pool, "Awa", "student", None, None).await;
    let tutor = profile(&pool, "Moussa", "tutor", Some("moussa@example.com"), None).await;
    let booked = book(&pool, student, tutor, in_minutes(120), false).await;

    let mailer = NotificationMailer::new(pool.clone(), notifier(&transport)).with_limits(50, 2);
    let first = mailer.run_once().await.unwrap();
    assert_eq!(first, MailerRunSummary { processed: 2, sent: 1, skipped: 1 });

    let rows = NotificationRepo::list_for_session(&pool, booked.session.id).await.unwrap();
    let student_row = rows
        .iter()
        .find(|n| n.kind == KIND_SESSION_CREATED_STUDENT)
        .unwrap();
    assert!(!student_row.delivered);
    assert_eq!(student_row.delivery_attempts, 1);
    assert_eq!(student_row.meta["email_error"], "NO_EMAIL");

    assert_eq!(mailer.run_once().await.unwrap().processed, 1);
    // At the cap of two attempts the row is no longer selected.
    assert_eq!(mailer.run_once().await.unwrap().processed, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn transport_failure_counts_an_attempt(pool: PgPool) {
    let transport = RecordingTransport::rejecting(&["moussa@example.com"]);
    let student = profile(&pool, "Awa", "student", Some("awa@example.com"), None).await;
    let tutor = profile(&pool, "Moussa", "tutor", Some("moussa@example.com"), None).await;
    book(&pool, student, tutor, in_minutes(120), false).await;

    let summary = NotificationMailer::new(pool.clone(), notifier(&transport))
        .run_once()
        .await
        .unwrap();

    assert_eq!(summary, MailerRunSummary { processed: 2, sent: 1, skipped: 1 });
    assert_eq!(transport.email_recipients(), vec!["awa@example.com".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_bookkeeping_write_does_not_stop_the_batch(pool: PgPool) {
    let transport = Arc::new(RecordingTransport::default());
    let student = profile(&pool, "Awa", "student", Some("awa@example.com"), None).await;
    let tutor = profile(&pool, "Moussa", "tutor", Some("moussa@example.com"), None).await;
    let booked = book(&pool, student, tutor, in_minutes(120), false).await;

    // Every update of the student's row fails.
    sqlx::query(&format!(
        "CREATE FUNCTION reject_student_notice() RETURNS trigger AS $$ \
         BEGIN \
             IF OLD.kind = '{KIND_SESSION_CREATED_STUDENT}' THEN \
                 RAISE EXCEPTION 'notifications unavailable'; \
             END IF; \
             RETURN NEW; \
         END $$ LANGUAGE plpgsql"
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_student_notice BEFORE UPDATE ON notifications \
         FOR EACH ROW EXECUTE FUNCTION reject_student_notice()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let summary = NotificationMailer::new(pool.clone(), notifier(&transport))
        .run_once()
        .await
        .unwrap();

    assert_eq!(summary, MailerRunSummary { processed: 2, sent: 2, skipped: 0 });
    assert_eq!(
        transport.email_recipients(),
        vec!["awa@example.com".to_string(), "moussa@example.com".to_string()]
    );
    let rows = NotificationRepo::list_for_session(&pool, booked.session.id).await.unwrap();
    let tutor_row = rows.iter().find(|n| n.kind == KIND_SESSION_CREATED_TUTOR).unwrap();
    let student_row = rows.iter().find(|n| n.kind == KIND_SESSION_CREATED_STUDENT).unwrap();
    assert!(tutor_row.delivered);
    assert!(!student_row.delivered);
}
