/// Shifts
///
/// A shift is one slot of volunteer work: a time window, a job, an optional
/// required formation and at most one shifter. Shifts are either generated
/// from period positions (the weekly template) or created by hand.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE shifts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     start_at TIMESTAMPTZ NOT NULL,
///     end_at TIMESTAMPTZ NOT NULL CHECK (end_at > start_at),
///     job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
///     formation_id UUID REFERENCES formations(id) ON DELETE SET NULL,
///     shifter_id UUID REFERENCES beneficiaries(id) ON DELETE SET NULL,
///     booker_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     booked_time TIMESTAMPTZ,
///     position_id UUID REFERENCES period_positions(id) ON DELETE SET NULL,
///     is_dismissed BOOLEAN NOT NULL DEFAULT FALSE,
///     dismissed_reason TEXT,
///     was_carried_out BOOLEAN NOT NULL DEFAULT FALSE,
///     locked BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Locking
///
/// A locked shift keeps its time window: [`Shift::update_times`] refuses to
/// touch it. Booking rules live in `services::shift`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const SHIFT_COLUMNS: &str = "id, start_at, end_at, job_id, formation_id, shifter_id, booker_id, \
     booked_time, position_id, is_dismissed, dismissed_reason, was_carried_out, locked, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shift {
    pub id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub job_id: Uuid,

    /// Formation the shifter must hold, if any
    pub formation_id: Option<Uuid>,

    /// Beneficiary doing the shift
    pub shifter_id: Option<Uuid>,

    /// User who booked it (the shifter or an admin on their behalf)
    pub booker_id: Option<Uuid>,
    pub booked_time: Option<DateTime<Utc>>,

    /// Period position this shift was generated from
    pub position_id: Option<Uuid>,

    pub is_dismissed: bool,
    pub dismissed_reason: Option<String>,

    /// Set once attendance has been checked
    pub was_carried_out: bool,

    /// Time window frozen
    pub locked: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShift {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub job_id: Uuid,
    pub formation_id: Option<Uuid>,
    pub position_id: Option<Uuid>,

    /// Pre-booked shifter, carried over from a fixed period position
    pub shifter_id: Option<Uuid>,
}

impl Shift {
    pub fn is_booked(&self) -> bool {
        self.shifter_id.is_some()
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_at <= now
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    pub async fn create<'e, E>(executor: E, data: CreateShift) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shifts (start_at, end_at, job_id, formation_id, position_id, shifter_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(data.start_at)
        .bind(data.end_at)
        .bind(data.job_id)
        .bind(data.formation_id)
        .bind(data.position_id)
        .bind(data.shifter_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Shifts starting in `[from, to)`
    pub async fn list_between(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS} FROM shifts
            WHERE start_at >= $1 AND start_at < $2
            ORDER BY start_at, job_id
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Free, not dismissed shifts starting after `now`
    pub async fn list_available(
        pool: &PgPool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS} FROM shifts
            WHERE start_at > $1 AND shifter_id IS NULL AND NOT is_dismissed
            ORDER BY start_at
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Shifts of a beneficiary starting after `since`
    pub async fn list_by_shifter_since(
        pool: &PgPool,
        shifter_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS} FROM shifts
            WHERE shifter_id = $1 AND start_at > $2
            ORDER BY start_at
            "#
        ))
        .bind(shifter_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Books a free shift
    ///
    /// Returns None when the shift does not exist or somebody booked it
    /// first; the `shifter_id IS NULL` guard makes concurrent bookings safe.
    pub async fn book(
        pool: &PgPool,
        id: Uuid,
        shifter_id: Uuid,
        booker_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET shifter_id = $2, booker_id = $3, booked_time = NOW()
            WHERE id = $1 AND shifter_id IS NULL
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(shifter_id)
        .bind(booker_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn free(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET shifter_id = NULL, booker_id = NULL, booked_time = NULL
            WHERE id = $1
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_locked(
        pool: &PgPool,
        id: Uuid,
        locked: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            "UPDATE shifts SET locked = $2 WHERE id = $1 RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(id)
        .bind(locked)
        .fetch_optional(pool)
        .await
    }

    /// Moves an unlocked shift
    ///
    /// Returns None when the shift does not exist or is locked.
    pub async fn update_times(
        pool: &PgPool,
        id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET start_at = $2, end_at = $3
            WHERE id = $1 AND NOT locked
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(start_at)
        .bind(end_at)
        .fetch_optional(pool)
        .await
    }

    pub async fn dismiss(
        pool: &PgPool,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET is_dismissed = TRUE, dismissed_reason = $2
            WHERE id = $1
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_carried_out(
        pool: &PgPool,
        id: Uuid,
        carried_out: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            "UPDATE shifts SET was_carried_out = $2 WHERE id = $1 RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(id)
        .bind(carried_out)
        .fetch_optional(pool)
        .await
    }

    /// Number of shifts a beneficiary actually did
    pub async fn count_carried_out(pool: &PgPool, shifter_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM shifts WHERE shifter_id = $1 AND was_carried_out",
        )
        .bind(shifter_id)
        .fetch_one(pool)
        .await
    }

    /// Whether a shift was already generated for this position and start
    pub async fn exists_for_position<'e, E>(
        executor: E,
        position_id: Uuid,
        start_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM shifts WHERE position_id = $1 AND start_at = $2)",
        )
        .bind(position_id)
        .bind(start_at)
        .fetch_one(executor)
        .await
    }
}
