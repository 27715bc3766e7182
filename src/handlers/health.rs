use axum::Json;
use axum::response::IntoResponse;

// liveness, no parameters
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Screenshot API running.",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
