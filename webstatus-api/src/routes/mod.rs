//! REST API Route Handlers
//!
//! Every cached handler follows the same shape: look the request up in its
//! operation cache, fall back to the storage client on a miss, and offer a
//! successful response back to the cache. Error responses are never cached.

pub mod features;
pub mod health;
pub mod usage;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use webstatus_storage::Store;

use crate::state::AppState;

/// Create the API router with all routes and middleware.
pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/features/:feature_id", get(features::get_feature::<S>))
        .route(
            "/v1/features/:feature_id/stats/usage/chrome/daily_stats",
            get(usage::list_chrome_daily_usage_stats::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
