/// Beneficiaries
///
/// A beneficiary is a person covered by a membership: they take shifts,
/// hold formations and log in through their linked user. Creating one goes
/// through `lifecycle::beneficiary::initialize_beneficiary`, which provisions
/// the user account in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE beneficiaries (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     membership_id UUID REFERENCES memberships(id) ON DELETE CASCADE,
///     firstname VARCHAR(255) NOT NULL,
///     lastname VARCHAR(255) NOT NULL,
///     phone VARCHAR(32),
///     address_street1 VARCHAR(255),
///     address_street2 VARCHAR(255),
///     address_zipcode VARCHAR(16),
///     address_city VARCHAR(255),
///     flying BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const BENEFICIARY_COLUMNS: &str = "id, user_id, membership_id, firstname, lastname, phone, \
     address_street1, address_street2, address_zipcode, address_city, flying, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Beneficiary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub membership_id: Option<Uuid>,
    pub firstname: String,
    pub lastname: String,
    pub phone: Option<String>,
    pub address_street1: Option<String>,
    pub address_street2: Option<String>,
    pub address_zipcode: Option<String>,
    pub address_city: Option<String>,

    /// Flying beneficiaries pick shifts freely instead of holding a fixed
    /// period position
    pub flying: bool,

    pub created_at: DateTime<Utc>,
}

/// Postal address, all parts optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street1.is_none()
            && self.street2.is_none()
            && self.zipcode.is_none()
            && self.city.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBeneficiary {
    pub user_id: Uuid,
    pub membership_id: Option<Uuid>,
    pub firstname: String,
    pub lastname: String,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub flying: bool,
}

impl Beneficiary {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Address, or None when no part of it is filled in
    pub fn address(&self) -> Option<Address> {
        let address = Address {
            street1: self.address_street1.clone(),
            street2: self.address_street2.clone(),
            zipcode: self.address_zipcode.clone(),
            city: self.address_city.clone(),
        };
        (!address.is_empty()).then_some(address)
    }

    /// Inserts a beneficiary for an existing user
    ///
    /// # Errors
    ///
    /// `beneficiaries_user_id_key` when the user already has a beneficiary.
    pub async fn create<'e, E>(executor: E, data: CreateBeneficiary) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let address = data.address.unwrap_or_default();

        sqlx::query_as::<_, Beneficiary>(&format!(
            r#"
            INSERT INTO beneficiaries (
                user_id, membership_id, firstname, lastname, phone,
                address_street1, address_street2, address_zipcode, address_city, flying
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {BENEFICIARY_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.membership_id)
        .bind(data.firstname)
        .bind(data.lastname)
        .bind(data.phone)
        .bind(address.street1)
        .bind(address.street2)
        .bind(address.zipcode)
        .bind(address.city)
        .bind(data.flying)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Beneficiary>(&format!(
            "SELECT {BENEFICIARY_COLUMNS} FROM beneficiaries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Beneficiary>(&format!(
            "SELECT {BENEFICIARY_COLUMNS} FROM beneficiaries WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_membership(
        pool: &PgPool,
        membership_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Beneficiary>(&format!(
            r#"
            SELECT {BENEFICIARY_COLUMNS} FROM beneficiaries
            WHERE membership_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(membership_id)
        .fetch_all(pool)
        .await
    }

    /// Grants a formation; granting it twice is a no-op
    pub async fn add_formation(
        pool: &PgPool,
        id: Uuid,
        formation_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO beneficiary_formations (beneficiary_id, formation_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(formation_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn remove_formation(
        pool: &PgPool,
        id: Uuid,
        formation_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM beneficiary_formations WHERE beneficiary_id = $1 AND formation_id = $2",
        )
        .bind(id)
        .bind(formation_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn formation_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT formation_id FROM beneficiary_formations WHERE beneficiary_id = $1",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beneficiary() -> Beneficiary {
        Beneficiary {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            membership_id: None,
            firstname: "Jean".to_string(),
            lastname: "Dupont".to_string(),
            phone: None,
            address_street1: None,
            address_street2: None,
            address_zipcode: None,
            address_city: None,
            flying: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(beneficiary().display_name(), "Jean Dupont");
    }

    #[test]
    fn test_address_is_optional() {
        let mut b = beneficiary();
        assert!(b.address().is_none());

        b.address_city = Some("Grenoble".to_string());
        let address = b.address().unwrap();
        assert_eq!(address.city.as_deref(), Some("Grenoble"));
        assert!(address.street1.is_none());
    }
}
