/// Door codes
///
/// The shop's key box is protected by a short numeric code that shifters
/// rotate: whoever opens the shop generates a new code, and the previous
/// codes are closed once the box has been reset. Every code records the user
/// who generated it (its registrar).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE codes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     value VARCHAR(16) NOT NULL,
///     registrar_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     closed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Digits in a generated code
pub const CODE_LENGTH: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Code {
    pub id: Uuid,
    pub value: String,
    pub registrar_id: Uuid,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

/// Random zero-padded numeric code
pub fn generate_value<R: Rng + ?Sized>(rng: &mut R) -> String {
    let max = 10u32.pow(CODE_LENGTH as u32);
    format!("{:0width$}", rng.gen_range(0..max), width = CODE_LENGTH)
}

impl Code {
    pub async fn create(pool: &PgPool, value: &str, registrar_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Code>(
            r#"
            INSERT INTO codes (value, registrar_id)
            VALUES ($1, $2)
            RETURNING id, value, registrar_id, closed, created_at
            "#,
        )
        .bind(value)
        .bind(registrar_id)
        .fetch_one(pool)
        .await
    }

    /// Creates a code with a random value
    pub async fn generate(pool: &PgPool, registrar_id: Uuid) -> Result<Self, sqlx::Error> {
        let value = generate_value(&mut rand::thread_rng());
        Self::create(pool, &value, registrar_id).await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Code>(
            "SELECT id, value, registrar_id, closed, created_at FROM codes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Most recent codes first
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Code>(
            r#"
            SELECT id, value, registrar_id, closed, created_at FROM codes
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Latest open code, the one currently set on the box
    pub async fn last_open(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Code>(
            r#"
            SELECT id, value, registrar_id, closed, created_at FROM codes
            WHERE NOT closed
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await
    }

    pub async fn set_closed(
        pool: &PgPool,
        id: Uuid,
        closed: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Code>(
            r#"
            UPDATE codes SET closed = $2
            WHERE id = $1
            RETURNING id, value, registrar_id, closed, created_at
            "#,
        )
        .bind(id)
        .bind(closed)
        .fetch_optional(pool)
        .await
    }

    /// Corrects a mistyped value
    pub async fn set_value(
        pool: &PgPool,
        id: Uuid,
        value: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Code>(
            r#"
            UPDATE codes SET value = $2
            WHERE id = $1
            RETURNING id, value, registrar_id, closed, created_at
            "#,
        )
        .bind(id)
        .bind(value)
        .fetch_optional(pool)
        .await
    }

    /// Closes every open code generated before `code`
    pub async fn close_older_than(pool: &PgPool, code: &Code) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE codes SET closed = TRUE WHERE NOT closed AND created_at < $1 AND id <> $2",
        )
        .bind(code.created_at)
        .bind(code.id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM codes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_generate_value_is_padded_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let value = generate_value(&mut rng);
            assert_eq!(value.len(), CODE_LENGTH);
            assert!(value.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
