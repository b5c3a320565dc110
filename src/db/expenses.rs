use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Category, Expense, TrackingMode};

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    amount: f64,
    reason: &str,
    category: Category,
    tracking_mode: TrackingMode,
    budget_id: Option<Uuid>,
    date: DateTime<Utc>,
) -> Result<Expense, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        "INSERT INTO expenses (user_id, amount, reason, category, tracking_mode, budget_id, date)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(category)
    .bind(tracking_mode)
    .bind(budget_id)
    .bind(date)
    .fetch_one(pool)
    .await
}

/// All filters are optional and combine with AND. Date bounds are inclusive.
#[derive(Debug, Default)]
pub struct ExpenseFilter {
    pub category: Option<Category>,
    pub tracking_mode: Option<TrackingMode>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses WHERE user_id = $1
           AND ($2::text IS NULL OR category = $2)
           AND ($3::text IS NULL OR tracking_mode = $3)
           AND ($4::timestamptz IS NULL OR date >= $4)
           AND ($5::timestamptz IS NULL OR date <= $5)
         ORDER BY date DESC",
    )
    .bind(user_id)
    .bind(filter.category)
    .bind(filter.tracking_mode)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_all(pool)
    .await
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM expenses")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn sum_all(pool: &PgPool) -> Result<f64, sqlx::Error> {
    let row: (f64,) = sqlx::query_as("SELECT COALESCE(SUM(amount), 0) FROM expenses")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
