use axum::Json;
use axum::extract::State;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_users: i64,
    pub total_expenses: i64,
    pub active_users_7_days: i64,
    pub active_users_30_days: i64,
    pub total_expense_amount: f64,
}

/// Point-in-time snapshot over the whole system, recomputed on every call.
pub async fn analytics(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    auth.require_admin()?;

    let now = Utc::now();
    let total_users = db::users::count_all(&state.pool).await?;
    let total_expenses = db::expenses::count_all(&state.pool).await?;
    let active_users_7_days =
        db::users::count_active_since(&state.pool, now - Duration::days(7)).await?;
    let active_users_30_days =
        db::users::count_active_since(&state.pool, now - Duration::days(30)).await?;
    let total_expense_amount = db::expenses::sum_all(&state.pool).await?;

    Ok(Json(AnalyticsResponse {
        total_users,
        total_expenses,
        active_users_7_days,
        active_users_30_days,
        total_expense_amount,
    }))
}
