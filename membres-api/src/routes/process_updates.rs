/// Process update endpoints
///
/// The changelog of how the shop works. Only process managers may read or
/// write it, whatever other role they hold.
///
/// - `GET /v1/process-updates`
/// - `POST /v1/process-updates`
/// - `DELETE /v1/process-updates/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use membres_shared::{
    auth::{
        context::AuthContext,
        voters::{ProcessUpdateAction, ProcessUpdateVoter, Voter},
    },
    models::process_update::{CreateProcessUpdate, ProcessUpdate},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProcessUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(url(message = "Invalid link"))]
    pub link: Option<String>,
}

fn authorize(auth: &AuthContext, action: ProcessUpdateAction) -> ApiResult<()> {
    ProcessUpdateVoter
        .vote(action, &(), Some(auth))
        .require(action)?;
    Ok(())
}

pub async fn list_process_updates(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ProcessUpdate>>> {
    authorize(&auth, ProcessUpdateAction::View)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    Ok(Json(ProcessUpdate::list(&state.db, limit).await?))
}

pub async fn create_process_update(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateProcessUpdateRequest>,
) -> ApiResult<(StatusCode, Json<ProcessUpdate>)> {
    authorize(&auth, ProcessUpdateAction::Create)?;
    req.validate()?;

    let update = ProcessUpdate::create(
        &state.db,
        CreateProcessUpdate {
            title: req.title.trim().to_string(),
            description: req.description,
            link: req.link,
            author_id: Some(auth.user_id),
        },
    )
    .await?;

    info!(process_update_id = %update.id, author_id = %auth.user_id, "Process update published");

    Ok((StatusCode::CREATED, Json(update)))
}

pub async fn delete_process_update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize(&auth, ProcessUpdateAction::Delete)?;

    if !ProcessUpdate::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Process update {} not found", id)));
    }

    info!(process_update_id = %id, user_id = %auth.user_id, "Process update deleted");

    Ok(StatusCode::NO_CONTENT)
}
