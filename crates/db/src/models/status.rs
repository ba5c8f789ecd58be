//! Status enums shared with the core crate.
//!
//! Discriminants match the seed order of the `*_statuses` lookup tables.

pub use educonnect_core::status::{MatchStatus, OutboxStatus, RequestStatus, StatusId};
