use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.name.trim().is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    if !EMAIL_RE.is_match(&req.email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, req.name.trim(), &req.email, &pw_hash, "user")
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("A user with this email already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    let claims = Claims::new(user.id, user.role.clone(), state.config.token_ttl_hours);
    let token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(AuthResponse {
        message: "User registered successfully".to_string(),
        token,
        user,
    }))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if let Err(retry_after) = state.login_limiter.check(&req.email) {
        return Err(AppError::RateLimited(format!(
            "Too many login attempts. Try again in {retry_after} seconds."
        )));
    }

    let user = db::users::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash)
        .map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_limiter.clear(&req.email);
    let user = db::users::touch_last_login(&state.pool, user.id).await?;

    let claims = Claims::new(user.id, user.role.clone(), state.config.token_ttl_hours);
    let token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}
