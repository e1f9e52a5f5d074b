// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, host, listings},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, cars, parts, host dashboard).
/// * Rate-limits the magic-link endpoints per client IP.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Keyed on the peer IP; the server must be started with
    // `into_make_service_with_connect_info` for the extractor to see it.
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(10)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let auth_routes = Router::new()
        .route("/magic-link", post(auth::request_magic_link))
        .route("/session", post(auth::create_session))
        .layer(GovernorLayer::new(governor_conf));

    let car_routes = Router::new()
        .route("/", get(listings::list_cars))
        .route("/featured", get(listings::featured_cars))
        .route("/compare", get(listings::compare_cars))
        .route("/{key}", get(listings::get_car));

    let part_routes = Router::new()
        .route("/", get(listings::list_parts))
        .route("/{key}", get(listings::get_part));

    let host_routes = Router::new()
        .route(
            "/listings",
            get(host::list_my_listings).post(host::create_listing),
        )
        .route("/listings/{id}", put(host::update_listing))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/cars", car_routes)
        .nest("/api/parts", part_routes)
        .nest("/api/host", host_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
