use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::UserResponse;
use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::response::ApiResponse;
use crate::domain::user::UserRole;
use crate::services::{Registration, Session};
use crate::state::AppState;

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub role: Option<UserRole>,
    pub phone_number: Option<String>,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response from successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub token: String,
    pub token_type: &'static str,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        let Session { user, token } = session;
        Self {
            id: user.id,
            email: user.email.as_str().to_string(),
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            token,
            token_type: "Bearer",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: String,
}

/// Register a new user
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = state
        .users
        .register(Registration {
            username: req.username,
            password: req.password,
            email: req.email,
            full_name: req.full_name,
            role: req.role,
            phone_number: req.phone_number,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            UserResponse::from(&user),
        )),
    ))
}

/// Login with username and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let session = state.users.authenticate(&req.username, &req.password).await?;
    Ok(Json(ApiResponse::with_message(
        "Login successful",
        LoginResponse::from(session),
    )))
}

/// Finish Google sign-in with the authorization code
///
/// GET /api/auth/google/callback?code=
pub async fn google_callback(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GoogleCallbackQuery>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let session = state.users.login_with_google(&query.code).await?;
    Ok(Json(ApiResponse::with_message(
        "Login successful",
        LoginResponse::from(session),
    )))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
