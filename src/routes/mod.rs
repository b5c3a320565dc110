pub mod admin;
pub mod auth;
pub mod budgets;
pub mod expenses;
pub mod socket;
pub mod users;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Expenses
        .route("/api/expenses", get(expenses::list).post(expenses::create))
        // Budgets
        .route("/api/budgets", get(budgets::current).post(budgets::create))
        .route("/api/budgets/all", get(budgets::list_all))
        // Users
        .route("/api/users", get(users::list))
        .route(
            "/api/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/api/users/{id}", delete(users::delete))
        // Admin
        .route("/api/admin/analytics", get(admin::analytics))
        // Realtime
        .route("/api/socket", get(socket::upgrade))
}
