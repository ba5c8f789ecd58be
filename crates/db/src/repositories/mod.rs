//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-statement writes open their
//! own transaction.

pub mod availability_repo;
pub mod match_repo;
pub mod notification_repo;
pub mod outbox_repo;
pub mod profile_repo;
pub mod rating_repo;
pub mod request_repo;
pub mod session_repo;

pub use availability_repo::AvailabilityRepo;
pub use match_repo::MatchRepo;
pub use notification_repo::NotificationRepo;
pub use outbox_repo::OutboxRepo;
pub use profile_repo::ProfileRepo;
pub use rating_repo::RatingRepo;
pub use request_repo::RequestRepo;
pub use session_repo::SessionRepo;
