use crate::api::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RepliesQuery {
    pub cookie: String,
}

// GET /api/replies?cookie=...
pub async fn get_replies(
    State(state): State<AppState>,
    Query(params): Query<RepliesQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    match state.backend.fetch_replies(&params.cookie).await {
        Ok(replies) => Ok(Json(serde_json::json!({ "replies": replies }))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
