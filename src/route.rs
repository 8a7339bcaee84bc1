//! Route definitions for the public feed API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handler::{is_alive, is_ready, list_ads, new_api_token};
use crate::middleware::require_bearer_token;
use crate::state::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /api/v1/ads` - Paginated feed (requires a bearer token)
/// - `POST /internal/newApiToken` - Issues a bearer token
/// - `GET /internal/isAlive` - Liveness probe
/// - `GET /internal/isReady` - Readiness probe
///
/// All routes are nested under the configured context path when one is set.
///
/// # Example Usage
///
/// ```no_run
/// # use public_feed::config::FeedConfig;
/// # use public_feed::state::AppState;
/// # use public_feed::route::create_app;
/// let state = AppState::new(FeedConfig::from_env().unwrap()).unwrap();
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    // Feed routes that require a valid token
    let api_routes = Router::new()
        .route("/v1/ads", get(list_ads))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_token,
        ));

    let internal_routes = Router::new()
        .route("/newApiToken", post(new_api_token))
        .route("/isAlive", get(is_alive))
        .route("/isReady", get(is_ready));

    let routes = Router::new()
        .nest("/api", api_routes)
        .nest("/internal", internal_routes);

    let context_path = state.config.context_path.clone();
    let app = if context_path.is_empty() {
        routes
    } else {
        Router::new().nest(&context_path, routes)
    };

    app.with_state(state)
}
