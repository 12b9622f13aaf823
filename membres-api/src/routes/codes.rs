/// Door code endpoints
///
/// Every action is decided by [`CodeVoter`]. Handlers gather what it needs:
/// the code, the shift history of the caller's beneficiary and the client
/// address.
///
/// # Endpoints
///
/// - `GET /v1/codes` - Recent codes the caller may view
/// - `POST /v1/codes` - Generate a new code, closing older ones
/// - `GET /v1/codes/:id`
/// - `PATCH /v1/codes/:id` - Correct a mistyped value
/// - `POST /v1/codes/:id/open`
/// - `POST /v1/codes/:id/close`
/// - `DELETE /v1/codes/:id` - Super admins only

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    middleware::client_ip::ClientIp,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use membres_shared::{
    auth::{
        context::AuthContext,
        voters::{CodeAction, CodeSubject, Voter},
    },
    models::{
        beneficiary::Beneficiary,
        code::{Code, CODE_LENGTH},
    },
    services::shift::{self, Attendance},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: i64 = 10;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListCodesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCodeRequest {
    pub value: String,
}

/// Shift history of the caller's beneficiary, None for accounts without one
async fn load_attendance(state: &AppState, auth: &AuthContext) -> ApiResult<Option<Attendance>> {
    let Some(beneficiary) = Beneficiary::find_by_user_id(&state.db, auth.user_id).await? else {
        return Ok(None);
    };

    let attendance =
        shift::attendance(&state.db, beneficiary.id, Utc::now(), &state.offset()).await?;

    Ok(Some(attendance))
}

/// Asks the voter about `action` on `code`
async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    action: CodeAction,
    code: Option<Code>,
    client_ip: ClientIp,
) -> ApiResult<()> {
    let subject = CodeSubject {
        code,
        attendance: load_attendance(state, auth).await?,
        client_ip: client_ip.0,
        now: Utc::now(),
    };

    state
        .code_voter
        .vote(action, &subject, Some(auth))
        .require(action)?;

    Ok(())
}

async fn find_code(state: &AppState, id: Uuid) -> ApiResult<Code> {
    Code::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Code {} not found", id)))
}

/// Lists recent codes, keeping those the caller may view
pub async fn list_codes(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
    Query(query): Query<ListCodesQuery>,
) -> ApiResult<Json<Vec<Code>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let codes = Code::list_recent(&state.db, limit).await?;
    let attendance = load_attendance(&state, &auth).await?;
    let now = Utc::now();

    let visible = codes
        .into_iter()
        .filter(|code| {
            let subject = CodeSubject {
                code: Some(code.clone()),
                attendance: attendance.clone(),
                client_ip: client_ip.0,
                now,
            };
            state
                .code_voter
                .vote(CodeAction::View, &subject, Some(&auth))
                .is_granted()
        })
        .collect();

    Ok(Json(visible))
}

pub async fn get_code(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Code>> {
    let code = find_code(&state, id).await?;
    authorize(&state, &auth, CodeAction::View, Some(code.clone()), client_ip).await?;

    Ok(Json(code))
}

/// Generates a new code
///
/// The voter sees the code currently open, since its registrar may
/// generate again on the same day. Older open codes are closed once the new
/// one exists.
pub async fn generate_code(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
) -> ApiResult<(StatusCode, Json<Code>)> {
    let last = Code::last_open(&state.db).await?;
    authorize(&state, &auth, CodeAction::Generate, last, client_ip).await?;

    let code = Code::generate(&state.db, auth.user_id).await?;
    let closed = Code::close_older_than(&state.db, &code).await?;

    info!(
        code_id = %code.id,
        registrar_id = %auth.user_id,
        closed_codes = closed,
        "Code generated"
    );

    Ok((StatusCode::CREATED, Json(code)))
}

pub async fn update_code(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCodeRequest>,
) -> ApiResult<Json<Code>> {
    if req.value.len() != CODE_LENGTH || !req.value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "value",
            format!("Code must be {} digits", CODE_LENGTH),
        )]));
    }

    let code = find_code(&state, id).await?;
    authorize(&state, &auth, CodeAction::Edit, Some(code), client_ip).await?;

    let updated = Code::set_value(&state.db, id, &req.value)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Code {} not found", id)))?;

    info!(code_id = %id, user_id = %auth.user_id, "Code corrected");

    Ok(Json(updated))
}

pub async fn open_code(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Code>> {
    set_closed(state, auth, client_ip, id, false).await
}

pub async fn close_code(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Code>> {
    set_closed(state, auth, client_ip, id, true).await
}

async fn set_closed(
    state: AppState,
    auth: AuthContext,
    client_ip: ClientIp,
    id: Uuid,
    closed: bool,
) -> ApiResult<Json<Code>> {
    let action = if closed {
        CodeAction::Close
    } else {
        CodeAction::Open
    };

    let code = find_code(&state, id).await?;
    authorize(&state, &auth, action, Some(code), client_ip).await?;

    let code = Code::set_closed(&state.db, id, closed)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Code {} not found", id)))?;

    info!(code_id = %id, user_id = %auth.user_id, closed, "Code state changed");

    Ok(Json(code))
}

pub async fn delete_code(
    State(state): State<AppState>,
    auth: AuthContext,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let code = find_code(&state, id).await?;
    authorize(&state, &auth, CodeAction::Delete, Some(code), client_ip).await?;

    Code::delete(&state.db, id).await?;

    info!(code_id = %id, user_id = %auth.user_id, "Code deleted");

    Ok(StatusCode::NO_CONTENT)
}
