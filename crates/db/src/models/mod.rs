//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts where the API creates rows
//! - An update DTO (all `Option` fields) for patches

pub mod availability;
pub mod notification;
pub mod outbox;
pub mod profile;
pub mod rating;
pub mod request;
pub mod session;
pub mod status;
pub mod tutor_match;
