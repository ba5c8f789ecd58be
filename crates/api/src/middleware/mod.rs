//! Request extractors guarding the API.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated profile from a JWT Bearer token.
//! - [`auth::CronAuth`] -- Requires the shared `x-cron-secret` header.

pub mod auth;
