/// Commissions: working groups of the association
///
/// Beneficiaries join commissions; some of them own it (they manage its
/// members and tasks).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COMMISSION_COLUMNS: &str = "id, name, email, description, next_meeting_desc, next_meeting_date";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Commission {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub next_meeting_desc: Option<String>,
    pub next_meeting_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommission {
    pub name: String,
    pub email: Option<String>,
    pub description: Option<String>,
}

impl Commission {
    pub async fn create(pool: &PgPool, data: CreateCommission) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Commission>(&format!(
            r#"
            INSERT INTO commissions (name, email, description)
            VALUES ($1, $2, $3)
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Commission>(&format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions ORDER BY name"
        ))
        .fetch_all(pool)
        .await
    }

    /// Adds a member, or updates their owner flag when already a member
    pub async fn add_beneficiary(
        pool: &PgPool,
        id: Uuid,
        beneficiary_id: Uuid,
        is_owner: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO commission_beneficiaries (commission_id, beneficiary_id, is_owner)
            VALUES ($1, $2, $3)
            ON CONFLICT (commission_id, beneficiary_id) DO UPDATE SET is_owner = EXCLUDED.is_owner
            "#,
        )
        .bind(id)
        .bind(beneficiary_id)
        .bind(is_owner)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn schedule_meeting(
        pool: &PgPool,
        id: Uuid,
        date: DateTime<Utc>,
        description: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Commission>(&format!(
            r#"
            UPDATE commissions
            SET next_meeting_date = $2, next_meeting_desc = $3
            WHERE id = $1
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(date)
        .bind(description)
        .fetch_optional(pool)
        .await
    }
}
