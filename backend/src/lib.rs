//! Task tracking HTTP API backed by SQLite.
//!
//! | Method | Path                   | Success        |
//! |--------|------------------------|----------------|
//! | POST   | `/tasks`               | 201 + task     |
//! | GET    | `/tasks?search=term`   | 200 + list     |
//! | PUT    | `/tasks/:id`           | 200 + task     |
//! | DELETE | `/tasks/:id`           | 204            |
//! | PATCH  | `/tasks/:id/completea` | 200 + task     |
//!
//! Anything else answers 404 with `{"message": "Route not found."}`.

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod file_store;
pub mod routes;

use db::DbPool;
use error::ApiError;
use routes::{create_task, delete_task, list_tasks, route_not_found, toggle_task, update_task};

pub fn app(pool: DbPool) -> Router {
    Router::new()
        .route(
            "/tasks",
            get(list_tasks).post(create_task).fallback(route_not_found),
        )
        .route(
            "/tasks/:id",
            put(update_task).delete(delete_task).fallback(route_not_found),
        )
        .route(
            "/tasks/:id/completea",
            patch(toggle_task).fallback(route_not_found),
        )
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use http_body_util::BodyExt;
    use shared::ErrorBody;
    use tower::ServiceExt;

    use super::*;
    use crate::error::INTERNAL_ERROR_MESSAGE;

    async fn boom() {
        panic!("secret stack detail")
    }

    #[tokio::test]
    async fn panics_become_generic_internal_errors() {
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
    }
}
