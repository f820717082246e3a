use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::response::ApiResponse;
use crate::domain::product::{Product, ProductCategory, ProductDetails};
use crate::domain::repositories::ProductQuery;
use crate::domain::user::UserRole;
use crate::state::AppState;

const READERS: &[UserRole] = &[UserRole::InvTeam, UserRole::DlTeam];
const WRITERS: &[UserRole] = &[UserRole::InvTeam];

/// Mutable product fields, shared by create and update bodies
#[derive(Debug, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    #[serde(default)]
    pub damaged: bool,
    #[serde(default)]
    pub perishable: bool,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub quantity: i32,
}

impl From<ProductFields> for ProductDetails {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            category: fields.category,
            damaged: fields.damaged,
            perishable: fields.perishable,
            expiry_date: fields.expiry_date,
            quantity: fields.quantity,
        }
    }
}

/// Request body for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub damaged: bool,
    pub perishable: bool,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id(),
            sku: product.sku().to_string(),
            name: product.name().to_string(),
            description: product.description().map(str::to_string),
            category: product.category(),
            damaged: product.is_damaged(),
            perishable: product.is_perishable(),
            expiry_date: product.expiry_date(),
            quantity: product.quantity(),
            version: product.version(),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}

fn to_responses(products: Vec<Product>) -> Vec<ProductResponse> {
    products.iter().map(ProductResponse::from).collect()
}

#[derive(Debug, Deserialize)]
pub struct QuantityChangeQuery {
    pub quantity_change: i32,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Create a product
///
/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ApiError> {
    auth.require(WRITERS)?;
    let product = state.products.create(req.sku, req.fields.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Product created successfully",
            ProductResponse::from(&product),
        )),
    ))
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    auth.require(READERS)?;
    let products = state.products.list(&ProductQuery::default()).await?;
    Ok(Json(ApiResponse::ok(to_responses(products))))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    auth.require(READERS)?;
    let product = state.products.get(id).await?;
    Ok(Json(ApiResponse::ok(ProductResponse::from(&product))))
}

/// Replace a product's fields
///
/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ProductFields>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    auth.require(WRITERS)?;
    let product = state.products.update(id, req.into()).await?;
    Ok(Json(ApiResponse::with_message(
        "Product updated successfully",
        ProductResponse::from(&product),
    )))
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    auth.require(WRITERS)?;
    state.products.delete(id).await?;
    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

/// Change stock by a signed amount; recorded in the ledger as an ADJUSTMENT
///
/// PATCH /api/products/:id/quantity?quantity_change=
pub async fn adjust_quantity(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<QuantityChangeQuery>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    auth.require(WRITERS)?;
    let product = state
        .inventory
        .adjust_quantity(id, query.quantity_change, auth.id())
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Quantity updated successfully",
        ProductResponse::from(&product),
    )))
}

/// GET /api/products/sku/:sku
pub async fn get_product_by_sku(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(sku): ApiPath<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    auth.require(READERS)?;
    let product = state.products.get_by_sku(&sku).await?;
    Ok(Json(ApiResponse::ok(ProductResponse::from(&product))))
}

/// GET /api/products/category/:category
pub async fn list_by_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(category): ApiPath<ProductCategory>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    auth.require(READERS)?;
    let products = state.products.by_category(category).await?;
    Ok(Json(ApiResponse::ok(to_responses(products))))
}

/// GET /api/products/damaged
pub async fn list_damaged(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    auth.require(READERS)?;
    let products = state.products.damaged().await?;
    Ok(Json(ApiResponse::ok(to_responses(products))))
}

/// GET /api/products/perishable
pub async fn list_perishable(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    auth.require(READERS)?;
    let products = state.products.perishable().await?;
    Ok(Json(ApiResponse::ok(to_responses(products))))
}

/// Products expiring strictly before `date`
///
/// GET /api/products/expiring-before?date=
pub async fn list_expiring_before(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    auth.require(READERS)?;
    let products = state.products.expiring_before(query.date).await?;
    Ok(Json(ApiResponse::ok(to_responses(products))))
}

/// Products expiring within the range, both days included
///
/// GET /api/products/expiring-between?start_date=&end_date=
pub async fn list_expiring_between(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    auth.require(READERS)?;
    let products = state
        .products
        .expiring_between(query.start_date, query.end_date)
        .await?;
    Ok(Json(ApiResponse::ok(to_responses(products))))
}
