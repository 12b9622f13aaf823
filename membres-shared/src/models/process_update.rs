/// Process updates: announcements about how the association works
///
/// Only process managers publish or remove them, see
/// [`crate::auth::voters::ProcessUpdateVoter`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessUpdate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProcessUpdate {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub author_id: Option<Uuid>,
}

impl ProcessUpdate {
    pub async fn create(pool: &PgPool, data: CreateProcessUpdate) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProcessUpdate>(
            r#"
            INSERT INTO process_updates (title, description, link, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, link, author_id, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.link)
        .bind(data.author_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProcessUpdate>(
            "SELECT id, title, description, link, author_id, created_at FROM process_updates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Most recent first
    pub async fn list(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProcessUpdate>(
            r#"
            SELECT id, title, description, link, author_id, created_at
            FROM process_updates
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM process_updates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
