/// Registration form
///
/// Super admins may set every field, which lets them record a payment taken
/// on paper by somebody else. Other users only choose the amount and the
/// payment mode: the registrar is forced to themselves and the date to now.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use membres_shared::auth::context::AuthContext;
use membres_shared::auth::roles::Role;
use membres_shared::models::registration::{CreateRegistration, RegistrationMode};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::transformers::{DateTransformer, MoneyTransformer, UserToUsername};
use super::{Choice, FieldKind, FieldSpec, Form, FormError};

const MODES: [RegistrationMode; 5] = [
    RegistrationMode::Cash,
    RegistrationMode::Cheque,
    RegistrationMode::LocalCurrency,
    RegistrationMode::CreditCard,
    RegistrationMode::HelloAsso,
];

/// Submitted values, as typed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub mode: Option<RegistrationMode>,

    /// Username of the registrar
    pub registrar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    actor: AuthContext,
    privileged: bool,
}

impl RegistrationForm {
    pub fn build(actor: Option<&AuthContext>) -> Result<Self, FormError> {
        let actor = actor.ok_or(FormError::Unauthenticated)?;

        Ok(Self {
            privileged: actor.is_granted(Role::SuperAdmin),
            actor: actor.clone(),
        })
    }

    pub fn form(&self) -> Form {
        let restricted = !self.privileged;
        let modes = MODES
            .iter()
            .map(|mode| Choice {
                value: (*mode as i16).to_string(),
                label: mode.label(),
            })
            .collect();

        Form {
            name: "registration",
            fields: vec![
                FieldSpec::new("date", "Date", FieldKind::Date)
                    .required()
                    .disabled(restricted),
                FieldSpec::new("amount", "Montant", FieldKind::Money).required(),
                FieldSpec::new("mode", "Mode de paiement", FieldKind::Choice)
                    .required()
                    .with_choices(modes),
                FieldSpec::new("registrar", "Enregistré par", FieldKind::Autocomplete)
                    .required()
                    .disabled(restricted),
            ],
        }
    }

    /// Binds `input` once the registrar name has been resolved
    ///
    /// `registrar_id` is the resolved `registrar` field, only read for
    /// privileged users.
    pub fn bind(
        &self,
        membership_id: Uuid,
        input: &RegistrationInput,
        registrar_id: Option<Uuid>,
        now: DateTime<Utc>,
        offset: &FixedOffset,
    ) -> Result<CreateRegistration, FormError> {
        let amount = input.amount.as_deref().ok_or(FormError::missing("amount"))?;
        let amount_cents =
            MoneyTransformer::reverse(amount).map_err(FormError::transform("amount"))?;
        let mode = input.mode.ok_or(FormError::missing("mode"))?;

        if !self.privileged {
            if input.date.is_some() || input.registrar.is_some() {
                debug!(user_id = %self.actor.user_id, "Ignoring restricted registration fields");
            }

            return Ok(CreateRegistration {
                membership_id,
                registrar_id: Some(self.actor.user_id),
                date: now,
                amount_cents,
                mode,
            });
        }

        let date = match input.date.as_deref() {
            Some(raw) => {
                let day = DateTransformer::reverse(raw).map_err(FormError::transform("date"))?;
                offset
                    .from_local_datetime(&day.and_time(NaiveTime::MIN))
                    .single()
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or_else(|| FormError::Invalid {
                        field: "date",
                        message: "Date does not exist in local time".to_string(),
                    })?
            }
            None => now,
        };

        Ok(CreateRegistration {
            membership_id,
            registrar_id: registrar_id.or(Some(self.actor.user_id)),
            date,
            amount_cents,
            mode,
        })
    }

    /// Resolves the registrar then binds
    pub async fn submit(
        &self,
        pool: &PgPool,
        membership_id: Uuid,
        input: &RegistrationInput,
        now: DateTime<Utc>,
        offset: &FixedOffset,
    ) -> Result<CreateRegistration, FormError> {
        let registrar_id = match (self.privileged, input.registrar.as_deref()) {
            (true, Some(username)) => Some(
                UserToUsername::reverse(pool, username)
                    .await
                    .map_err(FormError::transform("registrar"))?
                    .id,
            ),
            _ => None,
        };

        self.bind(membership_id, input, registrar_id, now, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: Vec<Role>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "caissier".to_string(),
            roles,
        }
    }

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn input() -> RegistrationInput {
        RegistrationInput {
            date: Some("01/02/2025".to_string()),
            amount: Some("15".to_string()),
            mode: Some(RegistrationMode::Cheque),
            registrar: Some("someone".to_string()),
        }
    }

    #[test]
    fn test_anonymous_build_fails() {
        assert!(matches!(
            RegistrationForm::build(None),
            Err(FormError::Unauthenticated)
        ));
    }

    #[test]
    fn test_fields_disabled_for_admin() {
        let admin = actor(vec![Role::Admin]);
        let form = RegistrationForm::build(Some(&admin)).unwrap().form();

        assert!(form.field("date").unwrap().disabled);
        assert!(form.field("registrar").unwrap().disabled);
        assert!(!form.field("amount").unwrap().disabled);
        assert!(!form.field("mode").unwrap().disabled);
        assert_eq!(form.field("mode").unwrap().choices.len(), MODES.len());
    }

    #[test]
    fn test_fields_enabled_for_super_admin() {
        let super_admin = actor(vec![Role::SuperAdmin]);
        let form = RegistrationForm::build(Some(&super_admin)).unwrap().form();

        assert!(form.fields.iter().all(|field| !field.disabled));
    }

    #[test]
    fn test_restricted_user_forced_to_self_and_now() {
        let admin = actor(vec![Role::Admin]);
        let form = RegistrationForm::build(Some(&admin)).unwrap();
        let now = Utc::now();
        let membership_id = Uuid::new_v4();

        let created = form
            .bind(membership_id, &input(), Some(Uuid::new_v4()), now, &offset())
            .unwrap();

        assert_eq!(created.registrar_id, Some(admin.user_id));
        assert_eq!(created.date, now);
        assert_eq!(created.amount_cents, 1500);
        assert_eq!(created.mode, RegistrationMode::Cheque);
        assert_eq!(created.membership_id, membership_id);
    }

    #[test]
    fn test_super_admin_sets_date_and_registrar() {
        let super_admin = actor(vec![Role::SuperAdmin]);
        let form = RegistrationForm::build(Some(&super_admin)).unwrap();
        let registrar = Uuid::new_v4();

        let created = form
            .bind(Uuid::new_v4(), &input(), Some(registrar), Utc::now(), &offset())
            .unwrap();

        assert_eq!(created.registrar_id, Some(registrar));
        // Local midnight of 1 February
        assert_eq!(created.date.to_rfc3339(), "2025-01-31T23:00:00+00:00");
    }

    #[test]
    fn test_missing_amount() {
        let form = RegistrationForm::build(Some(&actor(vec![Role::Admin]))).unwrap();
        let input = RegistrationInput {
            amount: None,
            ..input()
        };

        let err = form
            .bind(Uuid::new_v4(), &input, None, Utc::now(), &offset())
            .unwrap_err();
        assert!(matches!(err, FormError::Invalid { field: "amount", .. }));
    }
}
