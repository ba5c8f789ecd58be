pub mod jobs;
pub mod matches;
pub mod notifications;
pub mod requests;
pub mod reservations;
pub mod sessions;
