//! Booking orchestrator.
//!
//! Turns an accepted match into a scheduled session. Two entry points share
//! the same core:
//!
//! - [`BookingOrchestrator::accept_match`]: the student accepts a proposed match.
//! - [`BookingOrchestrator::reserve`]: the student books a tutor directly,
//!   creating the match on the fly.
//!
//! Both are idempotent: replays return the session created by the first call.
//! Slot consumption and confirmation emails are best-effort and never fail
//! the booking.

pub mod availability;

use chrono::Utc;
use educonnect_core::booking::{
    meeting_link, plan_accept, plan_decline, resolve_bounds, resolve_lost_accept, AcceptPlan,
    DeclinePlan, SessionBounds,
};
use educonnect_core::error::CoreError;
use educonnect_core::notification_kinds::{
    KIND_SESSION_CREATED_STUDENT, KIND_SESSION_CREATED_TUTOR,
};
use educonnect_core::roles::ROLE_TUTOR;
use educonnect_core::status::{MatchStatus, RequestStatus};
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::session::{CreateSession, Session, SessionNotice};
use educonnect_db::models::tutor_match::TutorMatch;
use educonnect_db::repositories::{MatchRepo, ProfileRepo, RequestRepo, SessionRepo};
use educonnect_db::DbPool;
use educonnect_events::templates::{
    session_created_email, session_created_notice, Audience, SessionDetails,
};
use educonnect_events::{EmailMessage, Notifier};

use crate::config::BookingConfig;
use crate::error::{AppError, AppResult};

/// Outcome of a booking call.
#[derive(Debug, Clone)]
pub struct Booking {
    pub session: Session,
    /// `true` when this call inserted the session.
    pub created: bool,
    /// `true` when the match was already accepted before this call.
    pub already_accepted: bool,
}

/// How participants learn about a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    /// In-app rows stay undelivered and the mailer sweep emails them.
    Deferred,
    /// Emails go out right after commit; in-app rows are written delivered.
    Immediate,
}

/// Match and request facts needed to schedule a session.
struct BookingTarget {
    match_id: DbId,
    request_id: DbId,
    student_id: DbId,
    tutor_id: DbId,
    subject: String,
    mode: String,
}

pub struct BookingOrchestrator {
    pool: DbPool,
    notifier: Notifier,
    config: BookingConfig,
}

impl BookingOrchestrator {
    pub fn new(pool: DbPool, notifier: Notifier, config: BookingConfig) -> Self {
        Self {
            pool,
            notifier,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Accept a proposed match on behalf of the request's student.
    ///
    /// 1. Load the match with its request and check the actor owns it.
    /// 2. Plan the transition. A replay whose session exists returns it
    ///    without looking at the caller's times.
    /// 3. Resolve the session bounds (before any write).
    /// 4. Move the match `proposed -> accepted`, or recognise a replay.
    /// 5. Move the request `open -> matched`.
    /// 6. Create the session unless one already exists.
    pub async fn accept_match(
        &self,
        actor: DbId,
        match_id: DbId,
        starts_at: Option<Timestamp>,
        duration_min: Option<i64>,
    ) -> AppResult<Booking> {
        // 1. Load and authorise.
        let found = MatchRepo::find_with_request(&self.pool, match_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Match",
                id: match_id,
            })?;
        if found.student_id != actor {
            return Err(CoreError::Forbidden(
                "Only the student who made the request can accept this match".into(),
            )
            .into());
        }

        // 2. Plan.
        let plan = plan_accept(found.status())?;
        if plan == AcceptPlan::AlreadyAccepted {
            if let Some(session) = SessionRepo::find_by_match_id(&self.pool, found.id).await? {
                tracing::info!(match_id, session_id = session.id, "Accept replayed");
                return Ok(Booking {
                    session,
                    created: false,
                    already_accepted: true,
                });
            }
        }

        // 3. Bounds.
        let bounds = resolve_bounds(
            starts_at,
            duration_min,
            Utc::now(),
            &self.config.policy,
            &self.config.slot_tz,
        )?;

        // 4. Guarded transition.
        let already_accepted = self.settle_accept(found.id, plan).await?;

        // 5. Request status.
        self.mark_request_matched(found.request_id).await;

        // 6. Session.
        let target = BookingTarget {
            match_id: found.id,
            request_id: found.request_id,
            student_id: found.student_id,
            tutor_id: found.tutor_id,
            subject: found.subject,
            mode: found.mode,
        };
        let (session, created) = self
            .ensure_session(&target, &bounds, Confirmation::Deferred)
            .await?;

        tracing::info!(
            match_id,
            session_id = session.id,
            created,
            already_accepted,
            "Match accepted"
        );
        Ok(Booking {
            session,
            created,
            already_accepted,
        })
    }

    /// Book `tutor_id` for a request without a prior proposal.
    ///
    /// The session lasts `reservation_duration_min`. Participants are emailed
    /// synchronously once the session is committed.
    pub async fn reserve(
        &self,
        actor: DbId,
        request_id: DbId,
        tutor_id: DbId,
        starts_at: Option<Timestamp>,
    ) -> AppResult<Booking> {
        let request = RequestRepo::find_by_id(&self.pool, request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Request",
                id: request_id,
            })?;
        if request.student_id != actor {
            return Err(CoreError::Forbidden(
                "Only the student who made the request can reserve a tutor".into(),
            )
            .into());
        }
        if request.status() == Some(RequestStatus::Closed) {
            return Err(CoreError::InvalidState("Request is closed".into()).into());
        }

        ProfileRepo::find_by_id(&self.pool, tutor_id)
            .await?
            .filter(|p| p.role == ROLE_TUTOR)
            .ok_or(CoreError::NotFound {
                entity: "Tutor",
                id: tutor_id,
            })?;

        let bounds = resolve_bounds(
            starts_at,
            Some(self.config.reservation_duration_min),
            Utc::now(),
            &self.config.policy,
            &self.config.slot_tz,
        )?;

        let (match_id, already_accepted) = self
            .find_or_create_accepted(request_id, tutor_id)
            .await?;

        self.mark_request_matched(request_id).await;

        let target = BookingTarget {
            match_id,
            request_id,
            student_id: request.student_id,
            tutor_id,
            subject: request.subject,
            mode: request.mode,
        };
        let (session, created) = self
            .ensure_session(&target, &bounds, Confirmation::Immediate)
            .await?;

        tracing::info!(
            request_id,
            tutor_id,
            session_id = session.id,
            created,
            already_accepted,
            "Reservation booked"
        );
        Ok(Booking {
            session,
            created,
            already_accepted,
        })
    }

    /// Decline a proposed match on behalf of its tutor.
    ///
    /// Declining twice is a no-op; any other terminal state is rejected.
    pub async fn decline_match(&self, actor: DbId, match_id: DbId) -> AppResult<TutorMatch> {
        let found = MatchRepo::find_by_id(&self.pool, match_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Match",
                id: match_id,
            })?;
        if found.tutor_id != actor {
            return Err(CoreError::Forbidden(
                "Only the proposed tutor can decline this match".into(),
            )
            .into());
        }

        if plan_decline(found.status())? == DeclinePlan::Transition
            && !MatchRepo::transition(
                &self.pool,
                match_id,
                MatchStatus::Proposed,
                MatchStatus::Declined,
            )
            .await?
        {
            // Lost a race; only a concurrent decline is acceptable.
            let current = self.reload_match(match_id).await?;
            if current.status() != MatchStatus::Declined {
                return Err(CoreError::InvalidState(format!(
                    "Match changed to {} while declining",
                    current.status()
                ))
                .into());
            }
        }

        tracing::info!(match_id, tutor_id = actor, "Match declined");
        self.reload_match(match_id).await
    }

    // -----------------------------------------------------------------------
    // Shared steps
    // -----------------------------------------------------------------------

    /// Carry out an [`AcceptPlan`]. Returns `true` if the match was already
    /// accepted by someone else.
    async fn settle_accept(&self, match_id: DbId, plan: AcceptPlan) -> AppResult<bool> {
        match plan {
            AcceptPlan::AlreadyAccepted => Ok(true),
            AcceptPlan::Transition => {
                let moved = MatchRepo::transition(
                    &self.pool,
                    match_id,
                    MatchStatus::Proposed,
                    MatchStatus::Accepted,
                )
                .await?;
                if moved {
                    return Ok(false);
                }
                let current = self.reload_match(match_id).await?;
                resolve_lost_accept(current.status())?;
                Ok(true)
            }
        }
    }

    /// Find the `(request, tutor)` match in `accepted`, inserting it when
    /// absent. Returns the match id and whether it was accepted beforehand.
    async fn find_or_create_accepted(
        &self,
        request_id: DbId,
        tutor_id: DbId,
    ) -> AppResult<(DbId, bool)> {
        if let Some(created) = MatchRepo::insert_accepted(&self.pool, request_id, tutor_id).await? {
            return Ok((created.id, false));
        }

        let existing = MatchRepo::find_by_request_and_tutor(&self.pool, request_id, tutor_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Match for request {request_id} and tutor {tutor_id} vanished after conflict"
                ))
            })?;
        let plan = plan_accept(existing.status())?;
        let already_accepted = self.settle_accept(existing.id, plan).await?;
        Ok((existing.id, already_accepted))
    }

    async fn reload_match(&self, match_id: DbId) -> AppResult<TutorMatch> {
        Ok(MatchRepo::find_by_id(&self.pool, match_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Match",
                id: match_id,
            })?)
    }

    async fn mark_request_matched(&self, request_id: DbId) {
        if let Err(e) = RequestRepo::mark_matched(&self.pool, request_id).await {
            tracing::warn!(request_id, error = %e, "Failed to mark request matched");
        }
    }

    /// Return the match's session, creating it with `bounds` if none exists.
    ///
    /// The session, its outbox event and both in-app rows commit together.
    /// A concurrent insert for the same match yields the winner's row.
    async fn ensure_session(
        &self,
        target: &BookingTarget,
        bounds: &SessionBounds,
        confirmation: Confirmation,
    ) -> AppResult<(Session, bool)> {
        if let Some(existing) = SessionRepo::find_by_match_id(&self.pool, target.match_id).await? {
            return Ok((existing, false));
        }

        let input = CreateSession {
            match_id: target.match_id,
            request_id: target.request_id,
            student_id: target.student_id,
            tutor_id: target.tutor_id,
            starts_at: bounds.starts_at,
            ends_at: bounds.ends_at,
            mode: target.mode.clone(),
            meeting_link: meeting_link(&self.config.meeting_base_url, target.match_id, Utc::now()),
            slot_code: bounds.slot.code(),
        };

        let details = SessionDetails {
            subject: &target.subject,
            starts_at: Some(bounds.starts_at),
            meeting_link: Some(&input.meeting_link),
        };
        let notices = [
            (Audience::Student, target.student_id, KIND_SESSION_CREATED_STUDENT),
            (Audience::Tutor, target.tutor_id, KIND_SESSION_CREATED_TUTOR),
        ]
        .map(|(audience, user_id, kind)| {
            let (title, body) = session_created_notice(audience, &details);
            SessionNotice {
                user_id,
                kind: kind.to_string(),
                title,
                body,
                meta: serde_json::json!({ "subject": target.subject }),
                delivered: confirmation == Confirmation::Immediate,
            }
        });

        let (session, created) =
            SessionRepo::create_scheduled(&self.pool, &input, &notices).await?;

        if created {
            availability::consume(
                &self.pool,
                session.tutor_id,
                session.starts_at,
                &self.config.slot_tz,
            )
            .await;

            if confirmation == Confirmation::Immediate {
                self.send_confirmations(target, &session).await;
            }
        }

        Ok((session, created))
    }

    /// Email both participants about a new session. Failures are logged.
    async fn send_confirmations(&self, target: &BookingTarget, session: &Session) {
        let profiles =
            match ProfileRepo::find_many(&self.pool, &[session.student_id, session.tutor_id]).await
            {
                Ok(profiles) => profiles,
                Err(e) => {
                    tracing::warn!(session_id = session.id, error = %e, "Failed to load participants for confirmation");
                    return;
                }
            };

        let details = SessionDetails {
            subject: &target.subject,
            starts_at: Some(session.starts_at),
            meeting_link: Some(&session.meeting_link),
        };

        let mut messages = Vec::with_capacity(2);
        for (audience, user_id) in [
            (Audience::Student, session.student_id),
            (Audience::Tutor, session.tutor_id),
        ] {
            let Some(profile) = profiles.iter().find(|p| p.id == user_id) else {
                tracing::warn!(session_id = session.id, user_id, "Participant profile missing");
                continue;
            };
            let Some(email) = profile.email.as_deref().filter(|e| !e.trim().is_empty()) else {
                tracing::warn!(session_id = session.id, user_id, "Participant has no email");
                continue;
            };
            let rendered = session_created_email(audience, profile.full_name.as_deref(), &details);
            messages.push(EmailMessage {
                to: email.to_string(),
                subject: rendered.subject,
                html: rendered.html,
                text: rendered.text,
            });
        }

        let results =
            futures::future::join_all(messages.iter().map(|m| self.notifier.send_email(m))).await;
        for (message, result) in messages.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(session_id = session.id, to = %message.to, error = %e, "Confirmation email failed");
            }
        }
    }
}
