/// Shift endpoints
///
/// # Endpoints
///
/// - `GET /v1/shifts/upcoming` - Free shifts to come
/// - `POST /v1/shifts/:id/book` - Book for oneself, or for anyone as admin
/// - `POST /v1/shifts/:id/free` - The shifter or an admin
/// - `POST /v1/shifts/:id/lock` - Admin; freezes the time window
/// - `PATCH /v1/shifts/:id` - Admin; moves an unlocked shift
/// - `POST /v1/shifts/:id/dismiss` - Admin
/// - `POST /v1/shifts/:id/validate` - Admin; records attendance
/// - `POST /v1/shifts/generate` - Admin; creates a day's shifts from periods

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    forms::{transformers::DateTransformer, FormError},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use membres_shared::{
    auth::{context::AuthContext, roles::Role, voters::require_granted},
    models::{beneficiary::Beneficiary, shift::Shift},
    services::shift as shift_service,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

const DEFAULT_UPCOMING_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookRequest {
    /// Beneficiary to book for; defaults to the caller's own
    pub beneficiary_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DismissRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub carried_out: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// `dd/mm/yyyy` or ISO date
    pub date: String,
}

async fn own_beneficiary(state: &AppState, auth: &AuthContext) -> ApiResult<Beneficiary> {
    Beneficiary::find_by_user_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No beneficiary for this account".to_string()))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Shift {} not found", id))
}

pub async fn upcoming(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Shift>>> {
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT).clamp(1, 500);

    Ok(Json(Shift::list_available(&state.db, Utc::now(), limit).await?))
}

pub async fn book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    body: Option<Json<BookRequest>>,
) -> ApiResult<Json<Shift>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let beneficiary_id = match request.beneficiary_id {
        Some(beneficiary_id) => {
            let own = Beneficiary::find_by_user_id(&state.db, auth.user_id).await?;
            if own.map(|b| b.id) != Some(beneficiary_id) {
                require_granted(&auth, Role::Admin)?;
            }
            beneficiary_id
        }
        None => own_beneficiary(&state, &auth).await?.id,
    };

    let shift = shift_service::book(&state.db, id, beneficiary_id, auth.user_id, Utc::now()).await?;

    Ok(Json(shift))
}

pub async fn free(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Shift>> {
    let shift = Shift::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if !auth.is_granted(Role::Admin) {
        let own = own_beneficiary(&state, &auth).await?;
        if shift.shifter_id != Some(own.id) {
            return Err(ApiError::Forbidden(
                "Not allowed to free this shift".to_string(),
            ));
        }
    }

    Ok(Json(shift_service::free(&state.db, id, Utc::now()).await?))
}

pub async fn lock(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<LockRequest>,
) -> ApiResult<Json<Shift>> {
    require_granted(&auth, Role::Admin)?;

    let shift = Shift::set_locked(&state.db, id, req.locked)
        .await?
        .ok_or_else(|| not_found(id))?;

    info!(shift_id = %id, locked = req.locked, "Shift lock changed");

    Ok(Json(shift))
}

pub async fn reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> ApiResult<Json<Shift>> {
    require_granted(&auth, Role::Admin)?;

    let shift = shift_service::reschedule(&state.db, id, req.start_at, req.end_at).await?;

    info!(shift_id = %id, start_at = %shift.start_at, "Shift rescheduled");

    Ok(Json(shift))
}

pub async fn dismiss(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<DismissRequest>,
) -> ApiResult<Json<Shift>> {
    require_granted(&auth, Role::Admin)?;

    let shift = Shift::dismiss(&state.db, id, req.reason)
        .await?
        .ok_or_else(|| not_found(id))?;

    info!(shift_id = %id, "Shift dismissed");

    Ok(Json(shift))
}

/// Records whether the shifter actually came
pub async fn validate(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Json<Shift>> {
    require_granted(&auth, Role::Admin)?;

    let shift = Shift::set_carried_out(&state.db, id, req.carried_out)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(shift))
}

pub async fn generate(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Shift>>)> {
    require_granted(&auth, Role::Admin)?;

    let date = DateTransformer::reverse(&req.date).map_err(FormError::transform("date"))?;
    let shifts = shift_service::generate_for_date(
        &state.db,
        date,
        state.config.calendar.cycle_start,
        &state.offset(),
    )
    .await?;

    info!(date = %date, created = shifts.len(), "Shifts generated");

    Ok((StatusCode::CREATED, Json(shifts)))
}
