/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Login with username or email and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `POST /v1/auth/logout` - Logout
/// - `POST /v1/auth/password` - Change the current user's password
/// - `GET /v1/me` - Current user with their beneficiary and membership
///
/// Accounts are created by admins through `POST /v1/memberships`, there is
/// no self-registration.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use membres_shared::{
    auth::{context::AuthContext, jwt, password, roles::Role},
    lifecycle::first_password,
    models::{beneficiary::Beneficiary, membership::Membership, user::User},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, max = 255, message = "Login is required"))]
    pub login: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub username: String,
    pub roles: Vec<Role>,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// True until the user has chosen their own password
    pub password_to_set: bool,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub beneficiary: Option<Beneficiary>,
    pub membership: Option<Membership>,
}

/// Login endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "login": "JeanDupont",
///   "password": "..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `403 Forbidden`: Account disabled
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_login(&state.db, req.login.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid login or password".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid login or password".to_string(),
        ));
    }

    if !user.enabled {
        return Err(ApiError::Forbidden("Account disabled".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let access_claims = jwt::Claims::new(user.id, &user.username, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, &user.username, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        username: user.username.clone(),
        password_to_set: user.has_role(Role::PasswordToSet),
        roles: user.roles(),
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token. Disabled accounts
/// cannot refresh.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, unknown user
/// - `403 Forbidden`: Account disabled
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;
    if !user.enabled {
        return Err(ApiError::Forbidden("Account disabled".to_string()));
    }

    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Logout endpoint
///
/// Tokens are stateless, the client drops them. Reachable while a first
/// password is pending.
pub async fn logout(auth: AuthContext) -> StatusCode {
    info!(user_id = %auth.user_id, "User logged out");
    StatusCode::NO_CONTENT
}

/// Password change endpoint
///
/// Clears `ROLE_PASSWORD_TO_SET` once the new password is stored.
///
/// # Errors
///
/// - `401 Unauthorized`: Wrong current password
/// - `422 Unprocessable Entity`: Weak or unchanged password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    password::validate_password_strength(&req.new_password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("new_password", message)])
    })?;

    if req.new_password == req.current_password {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "new_password",
            "New password must differ from the current one",
        )]));
    }

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::set_password(&state.db, user.id, &password_hash).await?;
    first_password::password_changed(&state.db, user.id).await?;

    info!(user_id = %user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

/// Current user
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let beneficiary = Beneficiary::find_by_user_id(&state.db, user.id).await?;
    let membership = match beneficiary.as_ref().and_then(|b| b.membership_id) {
        Some(membership_id) => Membership::find_by_id(&state.db, membership_id).await?,
        None => None,
    };

    Ok(Json(MeResponse {
        user,
        beneficiary,
        membership,
    }))
}
