use crate::api::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use outflow_models::WorkspaceAccount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAccountRequest {
    pub account_name: String,
    pub workspace: String,
    pub daily_limit: usize,
    pub slack_cookie: String,
    // The upstream UI sends this one field in snake_case.
    #[serde(rename = "user_id")]
    pub user_id: String,
}

/// Store a workspace account; the cookie is sealed before it touches disk.
pub async fn add_account(
    State(state): State<AppState>,
    Json(payload): Json<AddAccountRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sealed_cookie = state
        .cipher
        .seal(&payload.slack_cookie)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let account = WorkspaceAccount::new(
        payload.user_id,
        payload.account_name,
        payload.workspace,
        payload.daily_limit,
    );

    state
        .storage
        .accounts
        .insert(&account, &sealed_cookie)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// List all accounts. Cookie material never leaves storage.
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.storage.accounts.list() {
        Ok(accounts) => Ok(Json(accounts)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.storage.accounts.delete(&account_id) {
        Ok(true) => Ok("Account deleted"),
        Ok(false) => Err((StatusCode::NOT_FOUND, "Account not found".to_string())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
