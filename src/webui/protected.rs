//! Sample bearer-protected endpoint, so the demo can run without a separate API.
//! Authorization is expected to happen in front of it; it always answers 200.

use axum::{
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

pub const PATH: &str = "/demo/protected";

pub fn routes() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods(Any);

    Router::new().route(PATH, any(protected)).layer(cors)
}

async fn protected(method: Method, headers: HeaderMap) -> Response {
    info!(
        %method,
        bearer = headers.contains_key(header::AUTHORIZATION),
        "Protected endpoint called"
    );

    if method == Method::OPTIONS {
        return (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")]).into_response();
    }
    Json(serde_json::json!({ "message": "This endpoint is protected" })).into_response()
}
