/// Formations: qualifications some shifts require (cashier, reception...)

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Formation {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFormation {
    pub name: String,
    pub description: Option<String>,
}

impl Formation {
    pub async fn create(pool: &PgPool, data: CreateFormation) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Formation>(
            r#"
            INSERT INTO formations (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Formation>("SELECT id, name, description FROM formations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Formation>("SELECT id, name, description FROM formations ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
