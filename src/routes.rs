use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/todos", get(api::list_active_todos).post(api::create_todo))
        .route("/todos/all", get(api::list_all_todos))
        .route(
            "/todos/{id}",
            get(api::get_todo).put(api::update_todo).delete(api::delete_todo),
        )
        .route("/todos/{id}/complete", post(api::complete_todo))
        .route("/completed", get(api::list_completed_todos))
        .route("/completed/{id}", delete(api::delete_completed_todo))
        .with_state(state)
}

/// The router with request tracing and a permissive CORS policy.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    router(state).layer(ServiceBuilder::new().layer(trace_layer).layer(cors))
}
