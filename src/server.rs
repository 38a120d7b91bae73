/// HTTP server setup and routing
use crate::{context::AppContext, error::AuthResult};
use axum::{
    http::{header, Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    // The frontend runs on a different origin in every deployment shape
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Health check endpoint (no middleware)
        .route("/health", get(health_check))
        .merge(crate::api::routes())
        .with_state(ctx)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> AuthResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Adsight account service listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| crate::error::AuthError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::AuthError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
