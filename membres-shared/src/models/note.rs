/// Notes left by staff on a membership, optionally as replies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: Uuid,
    pub membership_id: Uuid,
    pub author_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNote {
    pub membership_id: Uuid,
    pub author_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub text: String,
}

impl Note {
    pub async fn create(pool: &PgPool, data: CreateNote) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (membership_id, author_id, parent_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, membership_id, author_id, parent_id, text, created_at
            "#,
        )
        .bind(data.membership_id)
        .bind(data.author_id)
        .bind(data.parent_id)
        .bind(data.text)
        .fetch_one(pool)
        .await
    }

    /// Notes of a membership in writing order, replies included
    pub async fn list_by_membership(
        pool: &PgPool,
        membership_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            r#"
            SELECT id, membership_id, author_id, parent_id, text, created_at
            FROM notes
            WHERE membership_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(membership_id)
        .fetch_all(pool)
        .await
    }
}
