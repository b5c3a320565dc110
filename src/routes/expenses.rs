use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Budget, Category, Expense, TrackingMode};
use crate::realtime::RealtimeEvent;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub amount: f64,
    pub reason: String,
    pub category: Option<Category>,
    pub date: Option<DateTime<Utc>>,
    pub tracking_mode: Option<TrackingMode>,
    pub budget_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CreateExpenseResponse {
    pub message: String,
    pub expense: Expense,
    /// Post-decrement budget row, or null in free mode and when the
    /// budget step was skipped.
    pub budget: Option<Budget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<Json<CreateExpenseResponse>, AppError> {
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(AppError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }

    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("Description is required".to_string()));
    }

    let tracking_mode = req.tracking_mode.unwrap_or_default();
    let category = req.category.unwrap_or_default();
    let date = req.date.unwrap_or_else(Utc::now);

    // A budget reference only means something in budget mode; free mode
    // never stores one even if the client sent it.
    let budget_id = match tracking_mode {
        TrackingMode::Budget => Some(req.budget_id.ok_or_else(|| {
            AppError::BadRequest("A budget must be selected in budget mode".to_string())
        })?),
        TrackingMode::Free => None,
    };

    let expense = db::expenses::create(
        &state.pool,
        auth.user_id,
        req.amount,
        reason,
        category,
        tracking_mode,
        budget_id,
        date,
    )
    .await?;

    state
        .events
        .publish(auth.user_id, RealtimeEvent::expense_added(&expense));

    // The expense is already persisted at this point. If the decrement
    // matches no row the expense stays as recorded, with the skip logged
    // and reported instead of rolled back.
    let mut budget = None;
    let mut warning = None;
    if let Some(bid) = budget_id {
        match db::budgets::decrement_remaining(&state.pool, bid, auth.user_id, req.amount).await? {
            Some(updated) => {
                state
                    .events
                    .publish(auth.user_id, RealtimeEvent::budget_updated(&updated));
                budget = Some(updated);
            }
            None => {
                tracing::warn!(
                    user_id = %auth.user_id,
                    budget_id = %bid,
                    expense_id = %expense.id,
                    "budget step skipped: budget missing or owned by another user"
                );
                warning = Some(
                    "Budget not found; the expense was recorded but no balance was updated"
                        .to_string(),
                );
            }
        }
    }

    Ok(Json(CreateExpenseResponse {
        message: "Expense added successfully".to_string(),
        expense,
        budget,
        warning,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub category: Option<String>,
    pub tracking_mode: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let category = params
        .category
        .as_deref()
        .map(|s| {
            Category::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown category: {s}")))
        })
        .transpose()?;

    let tracking_mode = params
        .tracking_mode
        .as_deref()
        .map(|s| {
            TrackingMode::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown tracking mode: {s}")))
        })
        .transpose()?;

    let filter = db::expenses::ExpenseFilter {
        category,
        tracking_mode,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let expenses = db::expenses::list(&state.pool, auth.user_id, &filter).await?;

    Ok(Json(serde_json::json!({ "expenses": expenses })))
}
