/// Physical access badges
///
/// A card belongs to a beneficiary. Disabling keeps the row so that a lost
/// card can be traced; `disabled_at` records when it stopped working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const SWIPE_CARD_COLUMNS: &str = "id, code, number, beneficiary_id, enabled, created_at, disabled_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwipeCard {
    pub id: Uuid,
    pub code: String,
    pub number: Option<i32>,
    pub beneficiary_id: Uuid,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub disabled_at: Option<DateTime<Utc>>,
}

impl SwipeCard {
    pub async fn create(
        pool: &PgPool,
        code: &str,
        number: Option<i32>,
        beneficiary_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SwipeCard>(&format!(
            r#"
            INSERT INTO swipe_cards (code, number, beneficiary_id)
            VALUES ($1, $2, $3)
            RETURNING {SWIPE_CARD_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(number)
        .bind(beneficiary_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SwipeCard>(&format!(
            "SELECT {SWIPE_CARD_COLUMNS} FROM swipe_cards WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_enabled(
        pool: &PgPool,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SwipeCard>(&format!(
            r#"
            UPDATE swipe_cards
            SET enabled = $2,
                disabled_at = CASE WHEN $2 THEN NULL ELSE NOW() END
            WHERE id = $1
            RETURNING {SWIPE_CARD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(enabled)
        .fetch_optional(pool)
        .await
    }
}
