use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::response::ApiResponse;
use crate::domain::repositories::{Page, PageRequest, SortDirection, UserSortField};
use crate::domain::user::{User, UserRole};
use crate::services::ProfileUpdate;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// User as exposed over the API; never carries the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.as_str().to_string(),
            full_name: user.full_name.clone(),
            role: user.role,
            phone_number: user.phone_number.clone(),
            enabled: user.enabled,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Paging parameters for user listings
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<UserSortField>,
    pub direction: Option<SortDirection>,
}

impl PageParams {
    fn into_request(self) -> PageRequest<UserSortField> {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            self.sort_by.unwrap_or_default(),
            self.direction.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: UserRole,
}

/// Request body for a profile update; absent fields stay unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// List users
///
/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<UserResponse>>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let page = state.users.list(None, &params.into_request()).await?;
    Ok(Json(ApiResponse::ok(page.map(|u| UserResponse::from(&u)))))
}

/// Get a user by ID
///
/// GET /api/admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let user = state.users.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// Get a user by username
///
/// GET /api/admin/users/username/:username
pub async fn get_user_by_username(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let user = state.users.get_by_username(&username).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// List users holding a role
///
/// GET /api/admin/users/role/:role
pub async fn list_users_by_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(role): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<UserResponse>>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let role: UserRole = role.parse().map_err(ApiError::bad_request)?;
    let page = state.users.list(Some(role), &params.into_request()).await?;
    Ok(Json(ApiResponse::ok(page.map(|u| UserResponse::from(&u)))))
}

/// PUT /api/admin/users/:id/enable
pub async fn enable_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let user = state.users.set_enabled(id, true).await?;
    Ok(Json(ApiResponse::with_message(
        "User enabled",
        UserResponse::from(&user),
    )))
}

/// PUT /api/admin/users/:id/disable
pub async fn disable_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let user = state.users.set_enabled(id, false).await?;
    Ok(Json(ApiResponse::with_message(
        "User disabled",
        UserResponse::from(&user),
    )))
}

/// Change a user's role
///
/// PUT /api/admin/users/:id/role?role=
pub async fn update_user_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<RoleQuery>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    auth.require(&[UserRole::Admin])?;
    let user = state.users.set_role(id, query.role).await?;
    Ok(Json(ApiResponse::with_message(
        "User role updated",
        UserResponse::from(&user),
    )))
}

/// Delete a user
///
/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require(&[UserRole::Admin])?;
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own profile
///
/// GET /api/users/profile
pub async fn get_profile(auth: AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(UserResponse::from(auth.user())))
}

/// Update the caller's own profile
///
/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .users
        .update_profile(
            auth.id(),
            ProfileUpdate {
                full_name: req.full_name,
                email: req.email,
                phone_number: req.phone_number,
            },
        )
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Profile updated",
        UserResponse::from(&user),
    )))
}
