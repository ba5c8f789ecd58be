//! Well-known in-app notification kinds and outbox topics.
//!
//! These must match the values stored in `notifications.kind` and
//! `notification_outbox.topic`.

/// Student-side confirmation of a newly scheduled session.
pub const KIND_SESSION_CREATED_STUDENT: &str = "session_created_student";

/// Tutor-side confirmation of a newly scheduled session.
pub const KIND_SESSION_CREATED_TUTOR: &str = "session_created_tutor";

/// Student-side reminder for an upcoming session.
pub const KIND_SESSION_REMINDER_STUDENT: &str = "session_reminder_student";

/// Tutor-side reminder for an upcoming session.
pub const KIND_SESSION_REMINDER_TUTOR: &str = "session_reminder_tutor";

/// Kinds the notification mailer picks up for email delivery.
pub const MAILED_KINDS: [&str; 2] = [KIND_SESSION_CREATED_STUDENT, KIND_SESSION_CREATED_TUTOR];

/// Outbox topic: a matching run proposed a tutor for a request.
pub const TOPIC_MATCH_PROPOSED: &str = "match.proposed";

/// Outbox topic: a session was scheduled from an accepted match.
pub const TOPIC_SESSION_CREATED: &str = "session.created";
