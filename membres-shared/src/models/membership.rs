/// Memberships
///
/// A membership is the association record a household holds: one member
/// number, one or more beneficiaries, its registrations (payments) and its
/// standing flags.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     member_number INTEGER NOT NULL UNIQUE CHECK (member_number > 0),
///     withdrawn BOOLEAN NOT NULL DEFAULT FALSE,
///     withdrawn_date DATE,
///     frozen BOOLEAN NOT NULL DEFAULT FALSE,
///     frozen_change BOOLEAN NOT NULL DEFAULT FALSE,
///     first_shift_date DATE,
///     main_beneficiary_id UUID REFERENCES beneficiaries(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Standing
///
/// - **withdrawn**: the household left the association; it keeps its number
///   but can no longer book shifts
/// - **frozen**: temporarily exempt from shifts (parental leave, travel...)
/// - **frozen_change**: a freeze/unfreeze was requested and is applied at the
///   start of the next shift cycle by [`Membership::apply_frozen_changes`]
///
/// # Example
///
/// ```no_run
/// use membres_shared::models::membership::{CreateMembership, Membership};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let number = Membership::next_member_number(&pool).await?;
/// let membership = Membership::create(&pool, CreateMembership { member_number: number }).await?;
///
/// Membership::set_frozen(&pool, membership.id, true).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const MEMBERSHIP_COLUMNS: &str = "id, member_number, withdrawn, withdrawn_date, frozen, \
     frozen_change, first_shift_date, main_beneficiary_id, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,

    /// Public member number, unique
    pub member_number: i32,

    pub withdrawn: bool,
    pub withdrawn_date: Option<NaiveDate>,

    pub frozen: bool,

    /// Pending freeze toggle
    pub frozen_change: bool,

    /// Date of the first shift, anchors the shift cycle
    pub first_shift_date: Option<NaiveDate>,

    /// Beneficiary receiving membership mail
    pub main_beneficiary_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub member_number: i32,
}

impl Membership {
    /// Whether beneficiaries of this membership may take shifts
    pub fn can_take_shifts(&self) -> bool {
        !self.withdrawn && !self.frozen
    }

    /// Inserts a membership
    ///
    /// # Errors
    ///
    /// Returns a database error carrying `memberships_member_number_key` when
    /// the number is already taken.
    pub async fn create<'e, E>(executor: E, data: CreateMembership) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(&format!(
            "INSERT INTO memberships (member_number) VALUES ($1) RETURNING {MEMBERSHIP_COLUMNS}"
        ))
        .bind(data.member_number)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_member_number(
        pool: &PgPool,
        member_number: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE member_number = $1"
        ))
        .bind(member_number)
        .fetch_optional(pool)
        .await
    }

    /// Highest member number plus one
    ///
    /// Two concurrent callers can get the same number; the unique key makes
    /// the second insert fail with a conflict.
    pub async fn next_member_number<'e, E>(executor: E) -> Result<i32, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COALESCE(MAX(member_number), 0) + 1 FROM memberships")
            .fetch_one(executor)
            .await
    }

    /// Marks a membership withdrawn (today) or reinstates it
    pub async fn set_withdrawn(
        pool: &PgPool,
        id: Uuid,
        withdrawn: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET withdrawn = $2,
                withdrawn_date = CASE WHEN $2 THEN CURRENT_DATE ELSE NULL END
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(withdrawn)
        .fetch_optional(pool)
        .await
    }

    /// Freezes or unfreezes immediately and clears any pending request
    pub async fn set_frozen(
        pool: &PgPool,
        id: Uuid,
        frozen: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET frozen = $2, frozen_change = FALSE
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(frozen)
        .fetch_optional(pool)
        .await
    }

    /// Toggles the pending freeze request
    pub async fn request_frozen_change(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET frozen_change = NOT frozen_change
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Applies every pending freeze toggle, returns the number of rows changed
    pub async fn apply_frozen_changes(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE memberships SET frozen = NOT frozen, frozen_change = FALSE WHERE frozen_change",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_main_beneficiary<'e, E>(
        executor: E,
        id: Uuid,
        beneficiary_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE memberships SET main_beneficiary_id = $2 WHERE id = $1")
            .bind(id)
            .bind(beneficiary_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records the first shift date once; later calls keep the original date
    pub async fn set_first_shift_date(
        pool: &PgPool,
        id: Uuid,
        date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE memberships SET first_shift_date = $2 WHERE id = $1 AND first_shift_date IS NULL",
        )
        .bind(id)
        .bind(date)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Memberships ordered by member number
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships ORDER BY member_number LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
