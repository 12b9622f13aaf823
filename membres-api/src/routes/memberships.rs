/// Membership endpoints
///
/// # Endpoints
///
/// - `POST /v1/memberships` - Admin; creates a membership with its main
///   beneficiary and the beneficiary's account
/// - `GET /v1/memberships/:id` - Admin or a beneficiary of the membership
/// - `GET /v1/memberships/:id/registrations` - Same access as above
/// - `POST /v1/memberships/:id/registrations` - Admin; records a payment

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    forms::{
        membership::{MembershipForm, MembershipInput},
        registration::{RegistrationForm, RegistrationInput},
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use membres_shared::{
    auth::{context::AuthContext, roles::Role, voters::require_granted},
    lifecycle::create_membership as create_membership_with_main,
    models::{
        beneficiary::Beneficiary,
        membership::Membership,
        registration::Registration,
        user::User,
    },
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct CreatedMembership {
    pub membership: Membership,
    pub main_beneficiary: Beneficiary,
    pub user: User,

    /// Shown once so it can be handed to the new member
    pub generated_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MembershipDetail {
    pub membership: Membership,
    pub beneficiaries: Vec<Beneficiary>,
    pub last_registration: Option<Registration>,

    /// Expiration of the last registration
    pub valid_until: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

async fn find_membership(state: &AppState, id: Uuid) -> ApiResult<Membership> {
    Membership::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Membership {} not found", id)))
}

/// Admins see every membership, others only their own
async fn require_member_or_admin(
    state: &AppState,
    auth: &AuthContext,
    membership_id: Uuid,
) -> ApiResult<()> {
    if auth.is_granted(Role::Admin) {
        return Ok(());
    }

    let own = Beneficiary::find_by_user_id(&state.db, auth.user_id)
        .await?
        .and_then(|beneficiary| beneficiary.membership_id);

    if own == Some(membership_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not allowed to view this membership".to_string(),
        ))
    }
}

pub async fn create_membership(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<MembershipInput>,
) -> ApiResult<(StatusCode, Json<CreatedMembership>)> {
    require_granted(&auth, Role::Admin)?;

    let form = MembershipForm::build(Some(&auth))?;
    let (member_number, main) = form.bind(input)?;

    let (membership, initialized) =
        create_membership_with_main(&state.db, member_number, main).await?;

    info!(
        membership_id = %membership.id,
        member_number = membership.member_number,
        username = %initialized.user.username,
        created_by = %auth.user_id,
        "Membership created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedMembership {
            membership,
            main_beneficiary: initialized.beneficiary,
            user: initialized.user,
            generated_password: initialized.generated_password,
        }),
    ))
}

pub async fn get_membership(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MembershipDetail>> {
    let membership = find_membership(&state, id).await?;
    require_member_or_admin(&state, &auth, id).await?;

    let beneficiaries = Beneficiary::list_by_membership(&state.db, id).await?;
    let last_registration = Registration::last_for_membership(&state.db, id).await?;
    let now = Utc::now();

    Ok(Json(MembershipDetail {
        valid_until: last_registration.as_ref().map(Registration::expires_at),
        is_valid: last_registration
            .as_ref()
            .is_some_and(|registration| registration.is_valid_at(now)),
        membership,
        beneficiaries,
        last_registration,
    }))
}

pub async fn list_registrations(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Registration>>> {
    find_membership(&state, id).await?;
    require_member_or_admin(&state, &auth, id).await?;

    Ok(Json(Registration::list_by_membership(&state.db, id).await?))
}

/// Records a payment through [`RegistrationForm`]
///
/// Only super admins choose the date and the registrar.
pub async fn create_registration(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<RegistrationInput>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    require_granted(&auth, Role::Admin)?;
    find_membership(&state, id).await?;

    let form = RegistrationForm::build(Some(&auth))?;
    let data = form
        .submit(&state.db, id, &input, Utc::now(), &state.offset())
        .await?;
    let registration = Registration::create(&state.db, data).await?;

    info!(
        registration_id = %registration.id,
        membership_id = %id,
        amount_cents = registration.amount_cents,
        "Registration recorded"
    );

    Ok((StatusCode::CREATED, Json(registration)))
}
