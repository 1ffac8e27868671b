use axum::response::Json;
use serde_json::{Value, json};

/// Liveness check. Never touches the engine or the voice configuration.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
