//! Pedidos web service
//!
//! Clients browse the catalog and place orders; suppliers manage their
//! items and record how each order is dispatched.
//! Handles:
//! - Signup, login and logout with cookie sessions
//! - Role-exclusive routing (client / supplier)
//! - Observability (logging, metrics, request IDs)

pub mod forms;
pub mod handlers;
pub mod middleware;

use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use pedidos_common::{auth::SessionManager, config::AppConfig, db::DbPool, Repository};
use std::sync::Arc;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DbPool) -> Self {
        let sessions = Arc::new(SessionManager::from_config(&config));
        Self {
            config,
            db,
            sessions,
        }
    }

    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    use handlers::{accounts, catalog, fulfillment, health, orders};

    let request_timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests.max(1);

    let routes = Router::new()
        // Health endpoints
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        // Accounts
        .route(
            "/signup/client/",
            get(accounts::client_signup_page).post(accounts::client_signup),
        )
        .route(
            "/signup/supplier/",
            get(accounts::supplier_signup_page).post(accounts::supplier_signup),
        )
        .route("/login/", get(accounts::login_page).post(accounts::login))
        .route("/logout/", get(accounts::logout))
        // Client catalog and orders
        .route("/", get(catalog::client_home))
        .route("/item/{id}/", get(orders::item_detail))
        .route(
            "/item/{id}/order/",
            get(orders::create_order_page).post(orders::create_order),
        )
        .route(
            "/item/{id}/order/edit/{order_id}/",
            get(orders::edit_order_page).post(orders::edit_order),
        )
        .route(
            "/item/{id}/order/edit/{order_id}/delete/",
            get(orders::delete_order).post(orders::delete_order),
        )
        // Supplier catalog and fulfillment
        .route("/supplier/", get(catalog::supplier_home))
        .route(
            "/supplier/item/create/",
            get(catalog::create_item_page).post(catalog::create_item),
        )
        .route("/supplier/item/{id}/", get(catalog::supplier_item_detail))
        .route(
            "/supplier/item/{id}/edit/",
            get(catalog::edit_item_page).post(catalog::edit_item),
        )
        .route("/supplier/item/{id}/delete/", get(catalog::delete_item))
        .route(
            "/supplier/item/{id}/order/edit/{order_id}/",
            get(fulfillment::manage_order_page).post(fulfillment::manage_order),
        );

    routes
        .route_layer(axum_middleware::from_fn(middleware::metrics::track_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(ConcurrencyLimitLayer::new(max_concurrent)),
        )
        .with_state(state)
}
