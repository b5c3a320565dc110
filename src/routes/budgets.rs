use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    pub total_amount: f64,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !req.total_amount.is_finite() || req.total_amount <= 0.0 {
        return Err(AppError::BadRequest(
            "Budget amount must be a positive number".to_string(),
        ));
    }

    let end_date = req
        .end_date
        .unwrap_or_else(|| Utc::now() + Duration::days(30));

    let budget = db::budgets::create(&state.pool, auth.user_id, req.total_amount, end_date).await?;

    tracing::info!(
        user_id = %auth.user_id,
        budget_id = %budget.id,
        remaining = budget.remaining_amount,
        "budget created"
    );

    Ok(Json(serde_json::json!({
        "message": "Budget created successfully",
        "budget": budget,
    })))
}

/// The caller's current budget, meaning the most recently created one.
pub async fn current(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let budget = db::budgets::find_latest(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "budget": budget })))
}

pub async fn list_all(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let budgets = db::budgets::list_all(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "budgets": budgets })))
}
