use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Budget;

/// Creates a budget seeded against the user's full spending history:
/// `remaining_amount` starts at the total minus everything the user has
/// ever recorded. Read and write happen in one statement; a concurrent
/// expense insert cannot land in between.
pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    total_amount: f64,
    end_date: DateTime<Utc>,
) -> Result<Budget, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "INSERT INTO budgets (user_id, total_amount, remaining_amount, end_date)
         SELECT $1, $2,
                $2 - COALESCE((SELECT SUM(amount) FROM expenses WHERE user_id = $1), 0),
                $3
         RETURNING *",
    )
    .bind(user_id)
    .bind(total_amount)
    .bind(end_date)
    .fetch_one(pool)
    .await
}

/// The user's current budget is the most recently created one.
pub async fn find_latest(pool: &PgPool, user_id: Uuid) -> Result<Option<Budget>, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "SELECT * FROM budgets WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<Budget>, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "SELECT * FROM budgets WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Subtracts `amount` from the budget's remaining balance in a single
/// conditional UPDATE. Returns None when the budget does not exist or
/// belongs to a different user; the caller decides how to handle that.
/// The balance may go negative, which is how overspending is shown.
pub async fn decrement_remaining(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    amount: f64,
) -> Result<Option<Budget>, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "UPDATE budgets SET remaining_amount = remaining_amount - $3
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(amount)
    .fetch_optional(pool)
    .await
}
