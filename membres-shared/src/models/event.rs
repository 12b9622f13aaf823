/// General-assembly events and voting proxies
///
/// A membership that cannot attend an event gives its proxy; a beneficiary
/// from another membership accepts it and votes on its behalf.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE proxies (
///     id UUID PRIMARY KEY,
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     giver_id UUID REFERENCES memberships(id) ON DELETE CASCADE,
///     owner_id UUID REFERENCES beneficiaries(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL,
///     CONSTRAINT proxies_event_giver_key UNIQUE (event_id, giver_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const EVENT_COLUMNS: &str =
    "id, title, description, date, max_date_of_last_registration, need_proxy, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,

    /// Registrations after this date do not grant a vote at this event
    pub max_date_of_last_registration: Option<DateTime<Utc>>,

    pub need_proxy: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub max_date_of_last_registration: Option<DateTime<Utc>>,
    pub need_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proxy {
    pub id: Uuid,
    pub event_id: Uuid,
    pub giver_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Proxies are only exchanged for upcoming events that ask for them
    pub fn accepts_proxies(&self, now: DateTime<Utc>) -> bool {
        self.need_proxy && self.date > now
    }

    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, description, date, max_date_of_last_registration, need_proxy)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.date)
        .bind(data.max_date_of_last_registration)
        .bind(data.need_proxy)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

impl Proxy {
    /// Records that `giver_id` hands its vote over for `event_id`
    ///
    /// `owner_id` may already be known (proxy given to someone specific),
    /// otherwise the proxy waits for a volunteer to accept it.
    pub async fn give(
        pool: &PgPool,
        event_id: Uuid,
        giver_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Proxy>(
            r#"
            INSERT INTO proxies (event_id, giver_id, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, giver_id, owner_id, created_at
            "#,
        )
        .bind(event_id)
        .bind(giver_id)
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }

    /// Assigns an unclaimed proxy to `owner_id`
    ///
    /// Returns `None` when the proxy is already taken, or when the owner
    /// belongs to the giving membership.
    pub async fn accept(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Proxy>(
            r#"
            UPDATE proxies p
            SET owner_id = $2
            WHERE p.id = $1
              AND p.owner_id IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM beneficiaries b
                  WHERE b.id = $2 AND b.membership_id = p.giver_id
              )
            RETURNING p.id, p.event_id, p.giver_id, p.owner_id, p.created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Proxy>(
            r#"
            SELECT id, event_id, giver_id, owner_id, created_at
            FROM proxies
            WHERE event_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_accepts_proxies() {
        let now = Utc::now();
        let mut event = Event {
            id: Uuid::new_v4(),
            title: "AG".to_string(),
            description: None,
            date: now + Duration::days(10),
            max_date_of_last_registration: None,
            need_proxy: true,
            created_at: now,
        };
        assert!(event.accepts_proxies(now));

        event.date = now - Duration::days(1);
        assert!(!event.accepts_proxies(now));

        event.date = now + Duration::days(10);
        event.need_proxy = false;
        assert!(!event.accepts_proxies(now));
    }
}
