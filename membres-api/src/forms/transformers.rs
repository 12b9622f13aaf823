/// Value transformers
///
/// Each transformer turns a model value into the string shown in an input
/// and parses that string back. Entity transformers resolve their string
/// against the database:
///
/// - beneficiaries are written `#<member number> <Firstname> <Lastname>`
/// - users are written as their username

use chrono::NaiveDate;
use membres_shared::models::beneficiary::Beneficiary;
use membres_shared::models::membership::Membership;
use membres_shared::models::registration::format_cents;
use membres_shared::models::user::User;
use sqlx::PgPool;

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Invalid date {0:?}, expected dd/mm/yyyy")]
    InvalidDate(String),

    #[error("Invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("Invalid beneficiary {0:?}, expected #<number> <name>")]
    InvalidBeneficiary(String),

    #[error("No beneficiary matches {0:?}")]
    UnknownBeneficiary(String),

    #[error("No user named {0:?}")]
    UnknownUser(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// `dd/mm/yyyy`, ISO dates are accepted on input
pub struct DateTransformer;

impl DateTransformer {
    pub fn transform(date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    pub fn reverse(value: &str) -> Result<NaiveDate, TransformError> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .or_else(|_| value.parse::<NaiveDate>())
            .map_err(|_| TransformError::InvalidDate(value.to_string()))
    }
}

/// Euros with two decimals, `,` or `.` as separator
pub struct MoneyTransformer;

impl MoneyTransformer {
    pub fn transform(cents: i32) -> String {
        format_cents(cents)
    }

    pub fn reverse(value: &str) -> Result<i32, TransformError> {
        let invalid = || TransformError::InvalidAmount(value.to_string());
        let trimmed = value.trim().trim_end_matches('€').trim();

        let (units, fraction) = match trimmed.split_once([',', '.']) {
            Some((units, fraction)) => (units, fraction),
            None => (trimmed, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) || fraction.len() > 2 {
            return Err(invalid());
        }

        let units: i32 = units.parse().map_err(|_| invalid())?;
        let fraction: i32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i32>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(invalid)
    }
}

/// `#12 Jean Dupont` for the beneficiary Jean Dupont of membership 12
pub struct BeneficiaryToString;

impl BeneficiaryToString {
    pub fn transform(beneficiary: &Beneficiary, member_number: i32) -> String {
        format!("#{} {}", member_number, beneficiary.display_name())
    }

    /// Splits a label into member number and name; the name may be omitted
    pub fn parse(value: &str) -> Result<(i32, Option<String>), TransformError> {
        let invalid = || TransformError::InvalidBeneficiary(value.to_string());

        let rest = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        let (number, name) = match rest.split_once(char::is_whitespace) {
            Some((number, name)) => (number, Some(name.trim())),
            None => (rest, None),
        };
        let number = number.parse::<i32>().map_err(|_| invalid())?;
        let name = name.filter(|n| !n.is_empty()).map(str::to_string);

        Ok((number, name))
    }

    /// Finds the beneficiary a label designates
    ///
    /// Without a name, the main beneficiary of the membership is returned.
    pub async fn reverse(pool: &PgPool, value: &str) -> Result<Beneficiary, TransformError> {
        let unknown = || TransformError::UnknownBeneficiary(value.to_string());
        let (number, name) = Self::parse(value)?;

        let membership = Membership::find_by_member_number(pool, number)
            .await?
            .ok_or_else(unknown)?;
        let beneficiaries = Beneficiary::list_by_membership(pool, membership.id).await?;

        let found = match name {
            Some(name) => beneficiaries
                .into_iter()
                .find(|b| b.display_name().eq_ignore_ascii_case(&name)),
            None => beneficiaries
                .into_iter()
                .find(|b| Some(b.id) == membership.main_beneficiary_id),
        };

        found.ok_or_else(unknown)
    }
}

pub struct UserToUsername;

impl UserToUsername {
    pub fn transform(user: &User) -> String {
        user.username.clone()
    }

    pub async fn reverse(pool: &PgPool, value: &str) -> Result<User, TransformError> {
        let username = value.trim();
        User::find_by_username(pool, username)
            .await?
            .ok_or_else(|| TransformError::UnknownUser(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_date_transformer() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(DateTransformer::transform(date), "07/03/2025");
        assert_eq!(DateTransformer::reverse("07/03/2025").unwrap(), date);
        assert_eq!(DateTransformer::reverse(" 2025-03-07 ").unwrap(), date);
        assert!(DateTransformer::reverse("31/02/2025").is_err());
    }

    #[test]
    fn test_money_transformer() {
        assert_eq!(MoneyTransformer::transform(1550), "15.50");
        assert_eq!(MoneyTransformer::transform(-150), "-1.50");
        assert_eq!(MoneyTransformer::transform(-50), "-0.50");
        assert_eq!(MoneyTransformer::reverse("15").unwrap(), 1500);
        assert_eq!(MoneyTransformer::reverse("15,5").unwrap(), 1550);
        assert_eq!(MoneyTransformer::reverse("15.05 €").unwrap(), 1505);
        assert_eq!(MoneyTransformer::reverse("0").unwrap(), 0);

        for bad in ["", "-5", "1.234", "abc", ",50", "99999999999"] {
            assert!(MoneyTransformer::reverse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_beneficiary_label() {
        let beneficiary = Beneficiary {
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
        };

        let label = BeneficiaryToString::transform(&beneficiary, 42);
        assert_eq!(label, "#42 Jean Dupont");
        assert_eq!(
            BeneficiaryToString::parse(&label).unwrap(),
            (42, Some("Jean Dupont".to_string()))
        );
    }

    #[test]
    fn test_beneficiary_label_without_name() {
        assert_eq!(BeneficiaryToString::parse("#7").unwrap(), (7, None));
        assert_eq!(BeneficiaryToString::parse("  #7   ").unwrap(), (7, None));
        assert!(BeneficiaryToString::parse("7 Jean").is_err());
        assert!(BeneficiaryToString::parse("#x Jean").is_err());
    }
}
