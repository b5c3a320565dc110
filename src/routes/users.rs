use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

pub async fn profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({ "user": user })))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let user = db::users::update_name(&state.pool, auth.user_id, name).await?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(serde_json::json!({ "users": users })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    let target = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if target.is_admin() {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be deleted".to_string(),
        ));
    }

    // Expenses and budgets cascade with the user row.
    db::users::delete(&state.pool, id).await?;

    tracing::info!(admin_id = %auth.user_id, user_id = %id, "user deleted");

    Ok(Json(serde_json::json!({ "message": "User deleted successfully" })))
}
