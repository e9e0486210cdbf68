//! Request-scoped database connection middleware.
//!
//! This middleware wraps every database-backed route to:
//! 1. Acquire one connection from the pool
//! 2. Apply the session settings (`sql_mode`, `time_zone`)
//! 3. Attach a `ConnectionLease` to the request for the handler to use
//! 4. Release the connection once the handler has produced a response
//!
//! The connection is released exactly once whether the handler succeeds,
//! returns an error, panics, or the request is cancelled. The middleware
//! never builds a success response of its own: failures before the handler
//! runs are returned as `AppError` and rendered by its `IntoResponse` impl.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    db::{
        lease::{ConnectionLease, ConnectionSource},
        session::SessionConfig,
    },
    error::AppError,
};

/// State for `scope_connection`: where connections come from and how to
/// configure them.
#[derive(Clone)]
pub struct ConnectionScope<S> {
    source: S,
    session: Arc<SessionConfig>,
}

impl<S: ConnectionSource> ConnectionScope<S> {
    pub fn new(source: S, session: SessionConfig) -> Self {
        Self {
            source,
            session: Arc::new(session),
        }
    }
}

/// Connection-scoping middleware function.
///
/// # Flow
///
/// 1. Acquire a connection (waits up to the pool's acquire timeout)
/// 2. Run the session statements in order on that connection
/// 3. Insert the lease into request extensions, call the next handler
/// 4. Release the connection, then hand the handler's response back
///
/// # Errors
///
/// - Acquisition failure: logged, nothing to release, `AppError::Storage`
/// - Session setup failure: logged, connection released, `AppError::Storage`
pub async fn scope_connection<S: ConnectionSource>(
    State(scope): State<ConnectionScope<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let mut conn = scope.source.acquire().await.map_err(|err| {
        tracing::error!(error = %err, %method, %path, "failed to acquire database connection");
        AppError::Storage(err)
    })?;

    if let Err(err) = scope.source.configure(&mut conn, &scope.session).await {
        tracing::error!(error = %err, %method, %path, "failed to configure database session");
        scope.source.release(conn);
        return Err(AppError::Storage(err));
    }

    let (owner, lease) = ConnectionLease::issue(scope.source.clone(), conn);
    request.extensions_mut().insert(lease);

    let response = next.run(request).await;

    if !owner.release().await {
        tracing::warn!(%method, %path, "request connection already released");
    }

    if response.status().is_server_error() {
        tracing::warn!(status = %response.status(), %method, %path, "request failed");
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::lease::testing::CountingSource;
    use axum::{
        Extension, Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use serde_json::{Value, json};
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    type Lease = ConnectionLease<CountingSource>;
    type Stash = Arc<Mutex<Option<Lease>>>;

    async fn ok_handler(lease: Lease) -> Result<String, AppError> {
        let conn = lease.lock().await?;
        let session = conn
            .session
            .as_ref()
            .ok_or(AppError::ConnectionUnavailable)?;
        Ok(format!("{} {}", session.sql_mode, session.time_zone))
    }

    async fn fail_handler(lease: Lease) -> Result<String, AppError> {
        let _conn = lease.lock().await?;
        Err(AppError::Storage(sqlx::Error::RowNotFound))
    }

    async fn panic_handler(lease: Lease) -> String {
        let _conn = lease.lock().await;
        panic!("handler blew up");
    }

    async fn stash_handler(Extension(stash): Extension<Stash>, lease: Lease) -> StatusCode {
        *stash.lock().await = Some(lease);
        StatusCode::OK
    }

    fn app(source: CountingSource) -> Router {
        let scope = ConnectionScope::new(source, SessionConfig::default());
        Router::new()
            .route("/ok", get(ok_handler))
            .route("/fail", get(fail_handler))
            .route("/panic", get(panic_handler))
            .route_layer(from_fn_with_state(
                scope,
                scope_connection::<CountingSource>,
            ))
            .layer(CatchPanicLayer::new())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn session_is_applied_before_handler() {
        let source = CountingSource::default();
        let response = app(source.clone()).oneshot(get_request("/ok")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "TRADITIONAL -08:00");
        assert_eq!(source.counters.acquired(), 1);
        assert_eq!(source.counters.configured(), 1);
        assert_eq!(source.counters.released(), 1);
    }

    #[tokio::test]
    async fn handler_error_still_releases() {
        let source = CountingSource::default();
        let response = app(source.clone()).oneshot(get_request("/fail")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(source.counters.released(), 1);
    }

    #[tokio::test]
    async fn handler_panic_still_releases() {
        let source = CountingSource::default();
        let response = app(source.clone()).oneshot(get_request("/panic")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(source.counters.acquired(), 1);
        assert_eq!(source.counters.released(), 1);
    }

    #[tokio::test]
    async fn acquire_failure_skips_release() {
        let source = CountingSource {
            fail_acquire: true,
            ..Default::default()
        };
        let response = app(source.clone()).oneshot(get_request("/ok")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(
            body,
            json!({ "success": false, "message": "Internal server error", "data": null })
        );
        assert_eq!(source.counters.acquired(), 0);
        assert_eq!(source.counters.released(), 0);
    }

    #[tokio::test]
    async fn configure_failure_releases_without_running_handler() {
        let source = CountingSource {
            fail_configure: true,
            ..Default::default()
        };
        let response = app(source.clone()).oneshot(get_request("/ok")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(source.counters.acquired(), 1);
        assert_eq!(source.counters.configured(), 0);
        assert_eq!(source.counters.released(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn acquires_match_releases_under_concurrency() {
        let source = CountingSource::default();
        let app = app(source.clone());

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let app = app.clone();
                let uri = match i % 4 {
                    0 => "/fail",
                    1 => "/panic",
                    _ => "/ok",
                };
                tokio::spawn(async move { app.oneshot(get_request(uri)).await.unwrap().status() })
            })
            .collect();

        let mut failures = 0;
        for handle in handles {
            if handle.await.unwrap().is_server_error() {
                failures += 1;
            }
        }

        assert_eq!(failures, 20);
        assert_eq!(source.counters.acquired(), 40);
        assert_eq!(source.counters.released(), 40);
    }

    #[tokio::test]
    async fn lease_kept_past_request_cannot_reach_connection() {
        let source = CountingSource::default();
        let stash: Stash = Arc::new(Mutex::new(None));
        let scope = ConnectionScope::new(source.clone(), SessionConfig::default());
        let app = Router::new()
            .route("/stash", get(stash_handler))
            .route_layer(from_fn_with_state(
                scope,
                scope_connection::<CountingSource>,
            ))
            .layer(Extension(stash.clone()));

        let response = app.oneshot(get_request("/stash")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(source.counters.released(), 1);

        let kept = stash.lock().await.take().unwrap();
        assert!(matches!(
            kept.lock().await,
            Err(AppError::ConnectionUnavailable)
        ));
        drop(kept);
        assert_eq!(source.counters.released(), 1);
    }

    #[tokio::test]
    async fn handler_without_middleware_gets_500() {
        let app: Router = Router::new().route("/ok", get(ok_handler));
        let response = app.oneshot(get_request("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
