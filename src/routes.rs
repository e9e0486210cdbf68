//! HTTP router assembly.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, put},
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{DbPool, session::SessionConfig},
    handlers,
    middleware::connection::{self, ConnectionScope},
};

/// Build the application router.
///
/// Every matched route runs inside the connection-scoping middleware, so each
/// request holds exactly one configured connection. Unmatched paths are
/// answered with 404 without touching the pool.
pub fn build_router(pool: DbPool, session: SessionConfig) -> Router {
    let scope = ConnectionScope::new(pool, session);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/cars",
            get(handlers::cars::list_cars).post(handlers::cars::create_car),
        )
        .route(
            "/cars/{id}",
            put(handlers::cars::update_car).delete(handlers::cars::delete_car),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            scope,
            connection::scope_connection::<DbPool>,
        ))
        // Panics become 500s; the connection is still released when the
        // request future is dropped
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
