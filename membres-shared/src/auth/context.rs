/// Authenticated actor for the current request
///
/// The API's auth layer validates the bearer token, reloads the user and
/// inserts an [`AuthContext`] into the request extensions. Handlers take it
/// as an extractor argument; a missing context means the route was mounted
/// without the auth layer and is answered with 401.
///
/// ```
/// use membres_shared::auth::context::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     auth.username.clone()
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roles::{self, Role};
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            roles: user.roles(),
        }
    }

    /// Hierarchical check: a super admin is granted `Role::Admin`
    pub fn is_granted(&self, role: Role) -> bool {
        roles::is_granted(&self.roles, role)
    }

    /// Direct check, the hierarchy is not consulted
    pub fn holds(&self, role: Role) -> bool {
        roles::holds(&self.roles, role)
    }
}

/// Rejection when no authenticated user is attached to the request
#[derive(Debug)]
pub struct MissingAuthContext;

impl IntoResponse for MissingAuthContext {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "Authentication required").into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = MissingAuthContext;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(MissingAuthContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(roles: Vec<Role>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "test".to_string(),
            roles,
        }
    }

    #[test]
    fn test_granted_uses_hierarchy() {
        let ctx = context(vec![Role::SuperAdmin]);
        assert!(ctx.is_granted(Role::Admin));
        assert!(!ctx.holds(Role::Admin));
    }

    #[test]
    fn test_missing_context_is_unauthorized() {
        let response = MissingAuthContext.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
