/// Jobs: the kind of work a shift covers (shelving, cashier, reception...)
///
/// Disabled jobs keep their past shifts but no longer appear in planning
/// screens and no new shifts are generated for them.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, name, color, description, min_shifter_alert, enabled";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub name: String,

    /// Planning color, CSS notation
    pub color: String,

    pub description: Option<String>,

    /// Below this many booked shifters a slot is flagged as understaffed
    pub min_shifter_alert: i32,

    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub min_shifter_alert: i32,
}

impl Job {
    pub async fn create(pool: &PgPool, data: CreateJob) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (name, color, description, min_shifter_alert)
            VALUES ($1, $2, $3, $4)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.color)
        .bind(data.description)
        .bind(data.min_shifter_alert)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE enabled ORDER BY name"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn set_enabled(pool: &PgPool, id: Uuid, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE jobs SET enabled = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
