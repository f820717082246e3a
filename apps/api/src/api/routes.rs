use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{auth, deliveries, products, transactions, users};
use crate::state::AppState;

/// Builds the full application router
pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/google/callback", get(auth::google_callback))
        // Product routes
        .route(
            "/api/products",
            post(products::create_product).get(products::list_products),
        )
        .route("/api/products/damaged", get(products::list_damaged))
        .route("/api/products/perishable", get(products::list_perishable))
        .route(
            "/api/products/expiring-before",
            get(products::list_expiring_before),
        )
        .route(
            "/api/products/expiring-between",
            get(products::list_expiring_between),
        )
        .route("/api/products/sku/:sku", get(products::get_product_by_sku))
        .route(
            "/api/products/category/:category",
            get(products::list_by_category),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/:id/quantity", patch(products::adjust_quantity))
        // Inventory team delivery routes
        .route(
            "/api/invteam/deliveries",
            post(deliveries::assign_delivery).get(deliveries::list_deliveries),
        )
        .route(
            "/api/invteam/deliveries/damaged",
            get(deliveries::list_with_damaged_items),
        )
        .route(
            "/api/invteam/deliveries/date-range",
            get(deliveries::list_by_date_range),
        )
        .route(
            "/api/invteam/deliveries/agent/:agent_id",
            get(deliveries::list_by_agent),
        )
        .route(
            "/api/invteam/deliveries/status/:status",
            get(deliveries::list_by_status),
        )
        .route(
            "/api/invteam/deliveries/date/:date",
            get(deliveries::list_by_date),
        )
        .route("/api/invteam/deliveries/sku/:sku", get(deliveries::list_by_sku))
        .route("/api/invteam/deliveries/:id", get(deliveries::get_delivery))
        // Delivery team routes
        .route("/api/dlteam/deliveries/my", get(deliveries::my_deliveries))
        .route(
            "/api/dlteam/deliveries/my/today",
            get(deliveries::my_deliveries_today),
        )
        .route(
            "/api/dlteam/deliveries/my/pending",
            get(deliveries::my_pending_deliveries),
        )
        .route("/api/dlteam/deliveries/:id", get(deliveries::my_delivery))
        .route(
            "/api/dlteam/deliveries/:id/start",
            put(deliveries::start_delivery),
        )
        .route(
            "/api/dlteam/deliveries/:id/complete",
            put(deliveries::complete_delivery),
        )
        .route(
            "/api/dlteam/deliveries/:id/door-lock",
            put(deliveries::door_lock),
        )
        .route(
            "/api/dlteam/deliveries/:id/status",
            put(deliveries::update_status),
        )
        .route(
            "/api/dlteam/deliveries/:id/items",
            put(deliveries::update_items),
        )
        // Inventory ledger routes
        .route(
            "/api/inventory/transactions",
            post(transactions::create_transaction).get(transactions::list_transactions),
        )
        .route(
            "/api/inventory/transactions/date-range",
            get(transactions::list_by_time),
        )
        .route(
            "/api/inventory/transactions/product/:product_id",
            get(transactions::list_by_product),
        )
        .route(
            "/api/inventory/transactions/product/:product_id/date-range",
            get(transactions::list_by_product_and_time),
        )
        .route(
            "/api/inventory/transactions/sku/:sku",
            get(transactions::list_by_sku),
        )
        .route(
            "/api/inventory/transactions/type/:type",
            get(transactions::list_by_type),
        )
        .route(
            "/api/inventory/transactions/user/:user_id",
            get(transactions::list_by_user),
        )
        .route(
            "/api/inventory/transactions/delivery/:delivery_id",
            get(transactions::list_by_delivery),
        )
        .route(
            "/api/inventory/transactions/:id",
            get(transactions::get_transaction),
        )
        // Admin routes
        .route("/api/admin/users", get(users::list_users))
        .route(
            "/api/admin/users/username/:username",
            get(users::get_user_by_username),
        )
        .route("/api/admin/users/role/:role", get(users::list_users_by_role))
        .route(
            "/api/admin/users/:id",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/api/admin/users/:id/enable", put(users::enable_user))
        .route("/api/admin/users/:id/disable", put(users::disable_user))
        .route("/api/admin/users/:id/role", put(users::update_user_role))
        // Profile routes
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
