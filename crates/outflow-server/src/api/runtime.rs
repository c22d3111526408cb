use crate::api_response::success;
use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct Health {
    status: String,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

/// Reports whether the Node/Playwright runtime is usable on this host.
// GET /api/runtime
pub async fn probe() -> Result<Json<Value>, (StatusCode, String)> {
    match outflow_browser::probe_runtime().await {
        Ok(probe) => Ok(success(probe)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
