//! Repository for the `tutor_availability` table.

use educonnect_core::slot::Slot;
use educonnect_core::types::DbId;
use sqlx::PgPool;

use crate::models::availability::TutorAvailability;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tutor_id, day, pod, slot_code, created_at, updated_at";

/// Tutor slot inventory.
pub struct AvailabilityRepo;

impl AvailabilityRepo {
    /// Add an open slot. `with_code = false` stores a legacy row without the
    /// denormalised `slot_code`.
    pub async fn create(
        pool: &PgPool,
        tutor_id: DbId,
        slot: Slot,
        with_code: bool,
    ) -> Result<TutorAvailability, sqlx::Error> {
        let query = format!(
            "INSERT INTO tutor_availability (tutor_id, day, pod, slot_code)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TutorAvailability>(&query)
            .bind(tutor_id)
            .bind(slot.day.code())
            .bind(slot.pod.code())
            .bind(with_code.then(|| slot.code()))
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_tutor(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<Vec<TutorAvailability>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM tutor_availability WHERE tutor_id = $1 ORDER BY id");
        sqlx::query_as::<_, TutorAvailability>(&query)
            .bind(tutor_id)
            .fetch_all(pool)
            .await
    }

    /// Delete by exact `(tutor_id, slot_code)`. Returns rows deleted.
    pub async fn delete_by_slot_code(
        pool: &PgPool,
        tutor_id: DbId,
        slot_code: &str,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM tutor_availability WHERE tutor_id = $1 AND slot_code = $2")
                .bind(tutor_id)
                .bind(slot_code)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Delete by the looser `(tutor_id, day, pod)` pair. Returns rows deleted.
    pub async fn delete_by_day_pod(
        pool: &PgPool,
        tutor_id: DbId,
        slot: Slot,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM tutor_availability WHERE tutor_id = $1 AND day = $2 AND pod = $3",
        )
        .bind(tutor_id)
        .bind(slot.day.code())
        .bind(slot.pod.code())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
