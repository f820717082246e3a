use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::response::ApiResponse;
use crate::domain::inventory::{InventoryTransaction, TransactionType};
use crate::domain::repositories::TransactionQuery;
use crate::domain::user::UserRole;
use crate::services::NewTransaction;
use crate::state::AppState;

/// Request body for recording a ledger entry
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub delivery_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub user_id: Uuid,
    pub delivery_id: Option<Uuid>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<InventoryTransaction> for TransactionResponse {
    fn from(entry: InventoryTransaction) -> Self {
        Self {
            id: entry.id,
            product_id: entry.product_id,
            sku: entry.sku,
            transaction_type: entry.kind,
            quantity: entry.quantity,
            user_id: entry.user_id,
            delivery_id: entry.delivery_id,
            notes: entry.notes,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TimeRangeQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

type ListResult = Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError>;

async fn list(state: &AppState, auth: &AuthUser, query: TransactionQuery) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    let entries = state.inventory.list(&query).await?;
    Ok(Json(ApiResponse::ok(
        entries.into_iter().map(TransactionResponse::from).collect(),
    )))
}

/// Record a stock movement and apply it to the product
///
/// POST /api/inventory/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<TransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    auth.require(&[UserRole::InvTeam])?;
    let entry = state
        .inventory
        .record(
            NewTransaction {
                product_id: req.product_id,
                kind: req.transaction_type,
                quantity: req.quantity,
                delivery_id: req.delivery_id,
                notes: req.notes,
            },
            auth.id(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Transaction recorded successfully",
            TransactionResponse::from(entry),
        )),
    ))
}

/// GET /api/inventory/transactions
pub async fn list_transactions(State(state): State<AppState>, auth: AuthUser) -> ListResult {
    list(&state, &auth, TransactionQuery::default()).await
}

/// GET /api/inventory/transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<TransactionResponse>>, ApiError> {
    auth.require(&[UserRole::InvTeam])?;
    let entry = state.inventory.get(id).await?;
    Ok(Json(ApiResponse::ok(TransactionResponse::from(entry))))
}

/// GET /api/inventory/transactions/product/:product_id
pub async fn list_by_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(product_id): ApiPath<Uuid>,
) -> ListResult {
    let query = TransactionQuery {
        product_id: Some(product_id),
        ..Default::default()
    };
    list(&state, &auth, query).await
}

/// GET /api/inventory/transactions/product/:product_id/date-range
pub async fn list_by_product_and_time(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiQuery(range): ApiQuery<TimeRangeQuery>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    let entries = state
        .inventory
        .list_between(Some(product_id), range.start_time, range.end_time)
        .await?;
    Ok(Json(ApiResponse::ok(
        entries.into_iter().map(TransactionResponse::from).collect(),
    )))
}

/// GET /api/inventory/transactions/sku/:sku
pub async fn list_by_sku(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(sku): ApiPath<String>,
) -> ListResult {
    let query = TransactionQuery {
        sku: Some(sku),
        ..Default::default()
    };
    list(&state, &auth, query).await
}

/// GET /api/inventory/transactions/type/:type
pub async fn list_by_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(kind): ApiPath<TransactionType>,
) -> ListResult {
    let query = TransactionQuery {
        kind: Some(kind),
        ..Default::default()
    };
    list(&state, &auth, query).await
}

/// GET /api/inventory/transactions/user/:user_id
pub async fn list_by_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ListResult {
    let query = TransactionQuery {
        user_id: Some(user_id),
        ..Default::default()
    };
    list(&state, &auth, query).await
}

/// GET /api/inventory/transactions/delivery/:delivery_id
pub async fn list_by_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(delivery_id): ApiPath<Uuid>,
) -> ListResult {
    let query = TransactionQuery {
        delivery_id: Some(delivery_id),
        ..Default::default()
    };
    list(&state, &auth, query).await
}

/// GET /api/inventory/transactions/date-range?start_time=&end_time=
pub async fn list_by_time(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(range): ApiQuery<TimeRangeQuery>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    let entries = state
        .inventory
        .list_between(None, range.start_time, range.end_time)
        .await?;
    Ok(Json(ApiResponse::ok(
        entries.into_iter().map(TransactionResponse::from).collect(),
    )))
}
