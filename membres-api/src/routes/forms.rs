/// Form descriptions
///
/// Clients render inputs from these field lists. Fields a user may not set
/// come back disabled.
///
/// - `GET /v1/forms/registration`
/// - `GET /v1/forms/membership`

use crate::{
    error::ApiResult,
    forms::{membership::MembershipForm, registration::RegistrationForm, Form},
};
use axum::Json;
use membres_shared::auth::context::AuthContext;

pub async fn registration_form(auth: AuthContext) -> ApiResult<Json<Form>> {
    Ok(Json(RegistrationForm::build(Some(&auth))?.form()))
}

pub async fn membership_form(auth: AuthContext) -> ApiResult<Json<Form>> {
    Ok(Json(MembershipForm::build(Some(&auth))?.form()))
}
