use axum::Json;
use serde_json::{Value, json};

/// Handler for `GET /health`. No auth, no dependencies checked.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
