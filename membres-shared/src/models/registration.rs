/// Registrations: yearly membership fee payments
///
/// Each registration belongs to a membership and records who took the
/// payment (the registrar), when, how much and how. A membership is valid for
/// one year after its latest registration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE registrations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     membership_id UUID NOT NULL REFERENCES memberships(id) ON DELETE CASCADE,
///     registrar_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     date TIMESTAMPTZ NOT NULL,
///     amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
///     mode SMALLINT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Payment method, stored as its historical numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    Cash = 1,
    Cheque = 2,
    LocalCurrency = 3,
    CreditCard = 4,
    HelloAsso = 6,
}

impl RegistrationMode {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationMode::Cash => "Espèces",
            RegistrationMode::Cheque => "Chèque",
            RegistrationMode::LocalCurrency => "Monnaie locale",
            RegistrationMode::CreditCard => "Carte bancaire",
            RegistrationMode::HelloAsso => "HelloAsso",
        }
    }
}

/// `1550` -> `"15.50"`, `-50` -> `"-0.50"`
pub fn format_cents(cents: i32) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

const REGISTRATION_COLUMNS: &str =
    "id, membership_id, registrar_id, date, amount_cents, mode, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub membership_id: Uuid,

    /// User who took the payment
    pub registrar_id: Option<Uuid>,

    pub date: DateTime<Utc>,
    pub amount_cents: i32,
    pub mode: RegistrationMode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistration {
    pub membership_id: Uuid,
    pub registrar_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub amount_cents: i32,
    pub mode: RegistrationMode,
}

impl Registration {
    /// Date after which the membership must be renewed
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.date
            .checked_add_months(Months::new(12))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.date <= now && now < self.expires_at()
    }

    /// Amount formatted as euros, e.g. `"15.00"`
    pub fn amount_display(&self) -> String {
        format_cents(self.amount_cents)
    }

    pub async fn create(pool: &PgPool, data: CreateRegistration) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Registration>(&format!(
            r#"
            INSERT INTO registrations (membership_id, registrar_id, date, amount_cents, mode)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(data.membership_id)
        .bind(data.registrar_id)
        .bind(data.date)
        .bind(data.amount_cents)
        .bind(data.mode)
        .fetch_one(pool)
        .await
    }

    /// Registrations of a membership, latest first
    pub async fn list_by_membership(
        pool: &PgPool,
        membership_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Registration>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE membership_id = $1
            ORDER BY date DESC
            "#
        ))
        .bind(membership_id)
        .fetch_all(pool)
        .await
    }

    pub async fn last_for_membership(
        pool: &PgPool,
        membership_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Registration>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE membership_id = $1
            ORDER BY date DESC
            LIMIT 1
            "#
        ))
        .bind(membership_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn registration(amount_cents: i32) -> Registration {
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap();
        Registration {
            id: Uuid::new_v4(),
            membership_id: Uuid::new_v4(),
            registrar_id: None,
            date,
            amount_cents,
            mode: RegistrationMode::Cash,
            created_at: date,
        }
    }

    #[test]
    fn test_expiration_is_one_year_later() {
        let r = registration(1500);
        // Leap day clamps to the end of February
        assert_eq!(r.expires_at(), Utc.with_ymd_and_hms(2025, 2, 28, 10, 0, 0).unwrap());
        assert!(r.is_valid_at(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()));
        assert!(!r.is_valid_at(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(registration(1500).amount_display(), "15.00");
        assert_eq!(registration(1005).amount_display(), "10.05");
        assert_eq!(registration(0).amount_display(), "0.00");
    }

    #[test]
    fn test_negative_cents_keep_the_sign_in_front() {
        assert_eq!(format_cents(-150), "-1.50");
        assert_eq!(format_cents(-50), "-0.50");
        assert_eq!(format_cents(-5), "-0.05");
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&RegistrationMode::LocalCurrency).unwrap();
        assert_eq!(json, "\"local_currency\"");
        assert_eq!(RegistrationMode::HelloAsso as i16, 6);
    }
}
