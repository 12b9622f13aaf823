/// New membership form
///
/// Creates a membership and its main beneficiary. Only super admins choose
/// the member number; everybody else gets the next free one.

use membres_shared::auth::context::AuthContext;
use membres_shared::auth::roles::Role;
use membres_shared::lifecycle::BeneficiaryDraft;
use membres_shared::models::beneficiary::Address;
use serde::Deserialize;
use validator::Validate;

use super::{FieldKind, FieldSpec, Form, FormError};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BeneficiaryInput {
    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    pub firstname: String,

    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    pub lastname: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,

    pub address: Option<Address>,

    #[serde(default)]
    pub flying: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MembershipInput {
    #[validate(range(min = 1, message = "Member number must be positive"))]
    pub member_number: Option<i32>,

    #[validate(nested)]
    pub main_beneficiary: BeneficiaryInput,
}

impl From<BeneficiaryInput> for BeneficiaryDraft {
    fn from(input: BeneficiaryInput) -> Self {
        BeneficiaryDraft {
            membership_id: None,
            firstname: input.firstname.trim().to_string(),
            lastname: input.lastname.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            address: input.address.filter(|a| !a.is_empty()),
            flying: input.flying,
            user: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MembershipForm {
    can_choose_number: bool,
}

impl MembershipForm {
    pub fn build(actor: Option<&AuthContext>) -> Result<Self, FormError> {
        let actor = actor.ok_or(FormError::Unauthenticated)?;

        Ok(Self {
            can_choose_number: actor.is_granted(Role::SuperAdmin),
        })
    }

    pub fn form(&self) -> Form {
        Form {
            name: "membership",
            fields: vec![
                FieldSpec::new("member_number", "Numéro d'adhérent", FieldKind::Number)
                    .disabled(!self.can_choose_number),
                FieldSpec::new("firstname", "Prénom", FieldKind::Text).required(),
                FieldSpec::new("lastname", "Nom", FieldKind::Text).required(),
                FieldSpec::new("email", "Courriel", FieldKind::Email).required(),
                FieldSpec::new("phone", "Téléphone", FieldKind::Text),
                FieldSpec::new("address", "Adresse", FieldKind::Text),
                FieldSpec::new("flying", "Volant", FieldKind::Checkbox),
            ],
        }
    }

    /// Member number to use (None = next free) and the main beneficiary
    pub fn bind(
        &self,
        input: MembershipInput,
    ) -> Result<(Option<i32>, BeneficiaryDraft), FormError> {
        input.validate()?;

        let member_number = if self.can_choose_number {
            input.member_number
        } else {
            None
        };

        Ok((member_number, input.main_beneficiary.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn actor(roles: Vec<Role>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "admin".to_string(),
            roles,
        }
    }

    fn input(member_number: Option<i32>) -> MembershipInput {
        MembershipInput {
            member_number,
            main_beneficiary: BeneficiaryInput {
                firstname: " Jean ".to_string(),
                lastname: "Dupont".to_string(),
                email: "Jean.Dupont@Example.com".to_string(),
                phone: Some("  ".to_string()),
                address: Some(Address::default()),
                flying: true,
            },
        }
    }

    #[test]
    fn test_member_number_only_for_super_admin() {
        let admin = MembershipForm::build(Some(&actor(vec![Role::Admin]))).unwrap();
        assert!(admin.form().field("member_number").unwrap().disabled);
        let (number, _) = admin.bind(input(Some(12))).unwrap();
        assert_eq!(number, None);

        let super_admin = MembershipForm::build(Some(&actor(vec![Role::SuperAdmin]))).unwrap();
        assert!(!super_admin.form().field("member_number").unwrap().disabled);
        let (number, _) = super_admin.bind(input(Some(12))).unwrap();
        assert_eq!(number, Some(12));
    }

    #[test]
    fn test_beneficiary_is_normalized() {
        let form = MembershipForm::build(Some(&actor(vec![Role::Admin]))).unwrap();
        let (_, draft) = form.bind(input(None)).unwrap();

        assert_eq!(draft.firstname, "Jean");
        assert_eq!(draft.email, "jean.dupont@example.com");
        assert!(draft.phone.is_none());
        assert!(draft.address.is_none());
        assert!(draft.flying);
        assert!(draft.user.is_none());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let form = MembershipForm::build(Some(&actor(vec![Role::Admin]))).unwrap();
        let mut bad = input(None);
        bad.main_beneficiary.email = "not-an-email".to_string();

        assert!(matches!(form.bind(bad), Err(FormError::Validation(_))));
    }

    #[test]
    fn test_anonymous_build_fails() {
        assert!(matches!(MembershipForm::build(None), Err(FormError::Unauthenticated)));
    }
}
