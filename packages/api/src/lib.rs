use std::sync::Arc;

use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use middleware::jwt::jwt_middleware;
use state::State;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
};

pub mod entity;
mod middleware;
mod routes;

pub mod error;
pub mod openapi;
pub mod state;

#[cfg(test)]
mod test_support;

pub use axum;
pub mod auth {
    use crate::middleware;
    pub use middleware::jwt::AppUser;
}

pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .merge(routes::catalog::routes())
        .nest("/health", routes::health::routes())
        .nest("/orders", routes::order::routes())
        .nest("/admin", routes::admin::routes())
        .route("/openapi.json", get(openapi_json))
        .with_state(state.clone())
        .route("/version", get(|| async { env!("CARGO_PKG_VERSION") }))
        .layer(from_fn_with_state(state.clone(), jwt_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    Router::new().nest("/api/v1", router)
}

#[tracing::instrument(name = "GET /openapi.json")]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(openapi::ApiDoc::openapi())
}
