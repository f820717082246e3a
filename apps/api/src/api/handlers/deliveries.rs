use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::response::ApiResponse;
use crate::domain::delivery::{
    Delivery, DeliveryItem, DeliveryPriority, DeliveryStatus, ItemFlags,
};
use crate::domain::repositories::DeliveryQuery;
use crate::domain::user::UserRole;
use crate::services::{Assignment, ItemRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemRequestBody {
    pub sku: String,
    pub quantity: i32,
}

/// Request body for assigning a delivery
#[derive(Debug, Deserialize)]
pub struct AssignDeliveryRequest {
    pub delivery_agent_id: Uuid,
    pub items: Vec<ItemRequestBody>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub priority: Option<DeliveryPriority>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteDeliveryRequest {
    pub customer_name: String,
    pub customer_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct DoorLockRequest {
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: DeliveryStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemFlagsBody {
    pub sku: String,
    #[serde(default)]
    pub damaged: bool,
    #[serde(default)]
    pub returned: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Vec<ItemFlagsBody>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub delivery_agent_id: Uuid,
    pub items: Vec<DeliveryItem>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: Option<String>,
    pub status: DeliveryStatus,
    pub priority: DeliveryPriority,
    pub scheduled_date: NaiveDate,
    pub delivered_at: Option<DateTime<Utc>>,
    pub customer_signature: Option<String>,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Delivery> for DeliveryResponse {
    fn from(delivery: &Delivery) -> Self {
        Self {
            id: delivery.id(),
            delivery_agent_id: delivery.delivery_agent_id(),
            items: delivery.items().to_vec(),
            customer_name: delivery.customer_name().to_string(),
            customer_address: delivery.customer_address().to_string(),
            customer_phone: delivery.customer_phone().map(str::to_string),
            status: delivery.status(),
            priority: delivery.priority(),
            scheduled_date: delivery.scheduled_date(),
            delivered_at: delivery.delivered_at(),
            customer_signature: delivery.customer_signature().map(str::to_string),
            notes: delivery.notes().map(str::to_string),
            version: delivery.version(),
            created_at: delivery.created_at(),
            updated_at: delivery.updated_at(),
        }
    }
}

type ListResult = Result<Json<ApiResponse<Vec<DeliveryResponse>>>, ApiError>;
type OneResult = Result<Json<ApiResponse<DeliveryResponse>>, ApiError>;

fn list(deliveries: Vec<Delivery>) -> ListResult {
    Ok(Json(ApiResponse::ok(
        deliveries.iter().map(DeliveryResponse::from).collect(),
    )))
}

fn one(message: &str, delivery: Delivery) -> OneResult {
    Ok(Json(ApiResponse::with_message(
        message,
        DeliveryResponse::from(&delivery),
    )))
}

// ===== Inventory team =====

/// Assign a delivery to an agent and take its items out of stock
///
/// POST /api/invteam/deliveries
pub async fn assign_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<AssignDeliveryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeliveryResponse>>), ApiError> {
    auth.require(&[UserRole::InvTeam])?;
    let delivery = state
        .deliveries
        .assign(Assignment {
            delivery_agent_id: req.delivery_agent_id,
            items: req
                .items
                .into_iter()
                .map(|item| ItemRequest {
                    sku: item.sku,
                    quantity: item.quantity,
                })
                .collect(),
            customer_name: req.customer_name,
            customer_address: req.customer_address,
            customer_phone: req.customer_phone,
            status: req.status,
            priority: req.priority,
            scheduled_date: req.scheduled_date,
            notes: req.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Delivery assigned successfully",
            DeliveryResponse::from(&delivery),
        )),
    ))
}

/// GET /api/invteam/deliveries
pub async fn list_deliveries(State(state): State<AppState>, auth: AuthUser) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    list(state.deliveries.list(&DeliveryQuery::default()).await?)
}

/// GET /api/invteam/deliveries/:id
pub async fn get_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> OneResult {
    auth.require(&[UserRole::InvTeam])?;
    let delivery = state.deliveries.get(id).await?;
    Ok(Json(ApiResponse::ok(DeliveryResponse::from(&delivery))))
}

/// GET /api/invteam/deliveries/agent/:agent_id
pub async fn list_by_agent(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(agent_id): ApiPath<Uuid>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    list(state.deliveries.list_for_agent(agent_id).await?)
}

/// GET /api/invteam/deliveries/status/:status
pub async fn list_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(status): ApiPath<DeliveryStatus>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    let query = DeliveryQuery {
        status: Some(status),
        ..Default::default()
    };
    list(state.deliveries.list(&query).await?)
}

/// GET /api/invteam/deliveries/date/:date
pub async fn list_by_date(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(date): ApiPath<NaiveDate>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    list(state.deliveries.list_scheduled_between(date, date).await?)
}

/// GET /api/invteam/deliveries/date-range?start_date=&end_date=
pub async fn list_by_date_range(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    list(
        state
            .deliveries
            .list_scheduled_between(query.start_date, query.end_date)
            .await?,
    )
}

/// Deliveries carrying an item with this SKU
///
/// GET /api/invteam/deliveries/sku/:sku
pub async fn list_by_sku(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(sku): ApiPath<String>,
) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    let query = DeliveryQuery {
        item_sku: Some(sku),
        ..Default::default()
    };
    list(state.deliveries.list(&query).await?)
}

/// Deliveries with at least one item flagged damaged
///
/// GET /api/invteam/deliveries/damaged
pub async fn list_with_damaged_items(State(state): State<AppState>, auth: AuthUser) -> ListResult {
    auth.require(&[UserRole::InvTeam])?;
    let query = DeliveryQuery {
        damaged_items_only: true,
        ..Default::default()
    };
    list(state.deliveries.list(&query).await?)
}

// ===== Delivery team =====

/// GET /api/dlteam/deliveries/my
pub async fn my_deliveries(State(state): State<AppState>, auth: AuthUser) -> ListResult {
    auth.require(&[UserRole::DlTeam])?;
    list(state.deliveries.list_for_agent(auth.id()).await?)
}

/// GET /api/dlteam/deliveries/my/today
pub async fn my_deliveries_today(State(state): State<AppState>, auth: AuthUser) -> ListResult {
    auth.require(&[UserRole::DlTeam])?;
    list(state.deliveries.list_for_agent_today(auth.id()).await?)
}

/// GET /api/dlteam/deliveries/my/pending
pub async fn my_pending_deliveries(State(state): State<AppState>, auth: AuthUser) -> ListResult {
    auth.require(&[UserRole::DlTeam])?;
    list(state.deliveries.list_pending_for_agent(auth.id()).await?)
}

/// GET /api/dlteam/deliveries/:id
pub async fn my_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> OneResult {
    auth.require(&[UserRole::DlTeam])?;
    let delivery = state.deliveries.get_for_agent(id, auth.id()).await?;
    Ok(Json(ApiResponse::ok(DeliveryResponse::from(&delivery))))
}

/// PUT /api/dlteam/deliveries/:id/start
pub async fn start_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> OneResult {
    auth.require(&[UserRole::DlTeam])?;
    one("Delivery started", state.deliveries.start(id, auth.id()).await?)
}

/// PUT /api/dlteam/deliveries/:id/complete
pub async fn complete_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CompleteDeliveryRequest>,
) -> OneResult {
    auth.require(&[UserRole::DlTeam])?;
    let delivery = state
        .deliveries
        .complete(id, auth.id(), req.customer_name, req.customer_signature)
        .await?;
    one("Delivery completed", delivery)
}

/// PUT /api/dlteam/deliveries/:id/door-lock
pub async fn door_lock(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<DoorLockRequest>,
) -> OneResult {
    auth.require(&[UserRole::DlTeam])?;
    let delivery = state.deliveries.door_lock(id, auth.id(), req.notes).await?;
    one("Delivery marked as door lock", delivery)
}

/// PUT /api/dlteam/deliveries/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> OneResult {
    auth.require(&[UserRole::DlTeam])?;
    let delivery = state
        .deliveries
        .update_status(id, auth.id(), req.status, req.notes)
        .await?;
    one("Delivery status updated", delivery)
}

/// Flag items as damaged or returned
///
/// PUT /api/dlteam/deliveries/:id/items
pub async fn update_items(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateItemsRequest>,
) -> OneResult {
    auth.require(&[UserRole::DlTeam])?;
    let flags = req
        .items
        .into_iter()
        .map(|item| ItemFlags {
            sku: item.sku,
            damaged: item.damaged,
            returned: item.returned,
        })
        .collect();
    let delivery = state.deliveries.update_items(id, auth.id(), flags).await?;
    one("Delivery items updated", delivery)
}
