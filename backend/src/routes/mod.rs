//! Route definitions for the Mercado Express API

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health::health_check))
        // Public catalog
        .route("/businesses", get(handlers::business::list))
        .route("/businesses/:id", get(handlers::business::get))
        .route("/businesses/:id/menu", get(handlers::product::menu))
        .route("/businesses/:id/categories", get(handlers::product::categories))
        .route("/products/popular", get(handlers::product::popular))
        // Public order intake and tracking
        .route("/orders", post(handlers::order::create))
        .route("/orders/custom", post(handlers::order::create_custom))
        .route("/orders/transport", post(handlers::order::create_transport))
        .route("/orders/phone/:phone", get(handlers::order::by_phone))
        // End-user account flow
        .nest("/users", user_routes(state.clone()))
        // Back office
        .nest("/admin", admin_routes(state))
}

/// End-user routes: the verification flow is public, profile and order
/// history need a user token
fn user_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/profile",
            get(handlers::users::me).put(handlers::users::update_profile),
        )
        .route("/orders", get(handlers::users::my_orders))
        .route("/orders/:id", get(handlers::users::my_order))
        .route_layer(middleware::from_fn_with_state(state, auth::user_auth));

    Router::new()
        .route("/register", post(handlers::users::register))
        .route("/verify-phone", post(handlers::users::verify_phone))
        .route("/resend-code", post(handlers::users::resend_code))
        .route("/login", post(handlers::users::login))
        .route("/refresh", post(handlers::users::refresh))
        .merge(protected)
}

/// Back-office routes (admin token required except login/refresh)
fn admin_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // Admin accounts
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/me", get(handlers::auth::me))
        // Catalog management
        .route(
            "/businesses",
            get(handlers::business::list_all).post(handlers::business::create),
        )
        .route("/businesses/stats", get(handlers::business::stats))
        .route(
            "/businesses/:id",
            put(handlers::business::update).delete(handlers::business::delete),
        )
        .route("/businesses/:id/toggle", patch(handlers::business::toggle))
        .route(
            "/businesses/:id/products",
            get(handlers::product::list_by_business),
        )
        .route("/products", post(handlers::product::create))
        .route(
            "/products/:id",
            put(handlers::product::update).delete(handlers::product::delete),
        )
        .route("/products/:id/toggle", patch(handlers::product::toggle))
        // Order management
        .route("/orders", get(handlers::order::list))
        .route("/orders/stats", get(handlers::order::stats))
        .route("/orders/:id", get(handlers::order::get))
        .route("/orders/:id/status", put(handlers::order::update_status))
        .route("/custom-orders", get(handlers::order::list_custom))
        .route("/transport-requests", get(handlers::order::list_transport))
        // Customer accounts (read only)
        .route("/users", get(handlers::users::list_users))
        .route("/users/stats", get(handlers::users::user_stats))
        .route("/users/:id", get(handlers::users::user_detail))
        // Audit trail
        .route("/audit/logs", get(handlers::audit::list))
        .route_layer(middleware::from_fn_with_state(state, auth::admin_auth));

    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .merge(protected)
}
