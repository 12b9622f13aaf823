/// First password handling
///
/// Accounts created by somebody else (an admin registering a new member)
/// carry `ROLE_PASSWORD_TO_SET` until their owner picks a password. While
/// the marker is present, every authenticated request other than the
/// password change itself and logout is redirected to the password change.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::beneficiary::BeneficiaryDraft;
use crate::auth::roles::{self, Role};
use crate::models::user::User;

/// Route changing the current user's password
pub const PASSWORD_ROUTE: &str = "/v1/auth/password";

pub const LOGOUT_ROUTE: &str = "/v1/auth/logout";

/// Adds the marker to the user linked to `beneficiary` when that user has
/// not been persisted yet
///
/// Returns whether the marker was added. A beneficiary without a linked user
/// or linked to an existing user is left alone.
pub fn mark_password_to_set(beneficiary: &mut BeneficiaryDraft) -> bool {
    let Some(user) = beneficiary.user.as_mut() else {
        return false;
    };
    if user.id.is_some() {
        return false;
    }
    if !user.roles.contains(&Role::PasswordToSet) {
        user.roles.push(Role::PasswordToSet);
    }
    true
}

/// Where a request must be sent instead, if anywhere
pub fn first_password_redirect(granted: &[Role], path: &str) -> Option<&'static str> {
    if !roles::holds(granted, Role::PasswordToSet) {
        return None;
    }
    if path == PASSWORD_ROUTE || path == LOGOUT_ROUTE {
        return None;
    }
    Some(PASSWORD_ROUTE)
}

/// Reacts to a password change by dropping the marker
pub async fn password_changed(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    if let Some(user) = User::remove_role(pool, user_id, Role::PasswordToSet).await? {
        info!(user_id = %user.id, "First password set");
    }

    Ok(())
}
