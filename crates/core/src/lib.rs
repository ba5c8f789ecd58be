pub mod booking;
pub mod error;
pub mod notification_kinds;
pub mod roles;
pub mod slot;
pub mod status;
pub mod types;
pub mod validation;
