use crate::handlers::{self, AppState};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

const OPENAPI_SPEC: &str = include_str!("../openapi.yml");

/// Serves the bundled OpenAPI specification.
async fn serve_openapi_spec() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/yaml")],
        OPENAPI_SPEC,
    )
}

/// Serves the Swagger UI HTML page, pointed at `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>GSTIN Credibility API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Documentation and API routes. Rate limiting is applied by the caller.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // API Documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        // Scoring endpoints
        .route("/api/v1/gstin/validate", get(handlers::validate))
        .route("/api/v1/reports/:gstin", get(handlers::get_report))
        // Path advertised by the dashboard's API view
        .route("/api/v1/score/:gstin", get(handlers::get_report))
        .route(
            "/api/v1/reports/:gstin/explain",
            post(handlers::explain_report),
        )
        // Lookup lifecycle
        .route("/api/v1/lookups", post(handlers::create_lookup))
        .route("/api/v1/lookups/:id", get(handlers::get_lookup))
}

/// Full router without transport middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
}
