/// Connected services and their API clients
///
/// Each external service (wiki, forum, ...) gets at most one client whose
/// key and secret identify it.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const CLIENT_KEY_LENGTH: usize = 32;
const CLIENT_SECRET_LENGTH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub service_id: Uuid,
    pub client_key: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub redirect_uris: Vec<String>,
}

impl Service {
    pub async fn create(pool: &PgPool, data: CreateService) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (name, description, url, icon, public)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, url, icon, public
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.url)
        .bind(data.icon)
        .bind(data.public)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            "SELECT id, name, description, url, icon, public FROM services ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }
}

fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl Client {
    /// Creates the client of `service_id` with a freshly drawn key and secret
    pub async fn create_for_service<R: Rng + ?Sized>(
        pool: &PgPool,
        service_id: Uuid,
        redirect_uris: Vec<String>,
        rng: &mut R,
    ) -> Result<Self, sqlx::Error> {
        let client_key = random_token(rng, CLIENT_KEY_LENGTH);
        let secret = random_token(rng, CLIENT_SECRET_LENGTH);

        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (service_id, client_key, secret, redirect_uris)
            VALUES ($1, $2, $3, $4)
            RETURNING id, service_id, client_key, secret, redirect_uris
            "#,
        )
        .bind(service_id)
        .bind(client_key)
        .bind(secret)
        .bind(redirect_uris)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_service(
        pool: &PgPool,
        service_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            "SELECT id, service_id, client_key, secret, redirect_uris FROM clients WHERE service_id = $1",
        )
        .bind(service_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_token() {
        let mut rng = StdRng::seed_from_u64(7);
        let token = random_token(&mut rng, CLIENT_SECRET_LENGTH);

        assert_eq!(token.len(), CLIENT_SECRET_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
