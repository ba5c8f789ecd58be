use std::sync::Arc;

use educonnect_events::Notifier;

use crate::booking::BookingOrchestrator;
use crate::config::ServerConfig;
use crate::matching::TutorMatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: educonnect_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Email and chat transports shared with the job sweeps.
    pub notifier: Notifier,
    /// Candidate tutor search run after a request is created.
    pub matcher: Arc<dyn TutorMatcher>,
    pub booking: Arc<BookingOrchestrator>,
}

impl AppState {
    /// Assemble state from its collaborators, deriving the booking
    /// orchestrator from the pool, notifier and booking config.
    pub fn new(
        pool: educonnect_db::DbPool,
        config: ServerConfig,
        notifier: Notifier,
        matcher: Arc<dyn TutorMatcher>,
    ) -> Self {
        let booking = Arc::new(BookingOrchestrator::new(
            pool.clone(),
            notifier.clone(),
            config.booking.clone(),
        ));
        Self {
            pool,
            config: Arc::new(config),
            notifier,
            matcher,
            booking,
        }
    }
}
