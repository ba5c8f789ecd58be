//! Profile role names as carried in `profiles.role` and the JWT `role` claim.

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TUTOR: &str = "tutor";
pub const ROLE_ADMIN: &str = "admin";
