//! Repository for the `profiles` table.

use educonnect_core::types::DbId;
use sqlx::PgPool;

use crate::models::profile::{CreateProfile, Profile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, full_name, email, phone, role, subjects, created_at, updated_at";

/// Read access to user profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Insert a profile, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProfile) -> Result<Profile, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (full_name, email, phone, role, subjects)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(&input.full_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.role)
            .bind(&input.subjects)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load several profiles at once. Missing ids are simply absent.
    pub async fn find_many(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Profile>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
