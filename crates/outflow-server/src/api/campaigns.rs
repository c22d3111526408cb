use crate::api::state::AppState;
use crate::api_response::{queued, success};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use outflow_models::{CampaignJob, CampaignSpec};
use serde::Deserialize;
use serde_json::Value;

/// Queued dispatch: campaigns run against stored accounts, cookies
/// are resolved and decrypted server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub campaign_name: String,
    pub account_ids: Vec<String>,
    pub profile_urls: Vec<String>,
    pub message_template: String,
    pub delay_between_messages: u64,
    pub max_messages_per_day: usize,
}

impl CreateCampaignRequest {
    fn to_spec(&self) -> CampaignSpec {
        CampaignSpec {
            name: self.campaign_name.clone(),
            profiles: self.profile_urls.clone(),
            message: self.message_template.clone(),
            delay_secs: self.delay_between_messages,
            limit: self.max_messages_per_day,
        }
    }
}

/// Synchronous dispatch: the caller supplies the cookie and waits for
/// the full result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCampaignRequest {
    pub campaign_name: String,
    pub cookie: String,
    pub profile_urls: Vec<String>,
    pub message_template: String,
    pub delay_between_messages: u64,
    pub max_messages_per_day: usize,
}

// POST /api/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(payload): Json<CreateCampaignRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let spec = payload.to_spec();

    // Every account must resolve before anything is enqueued; a bad id
    // in the list fails the whole request with no stray jobs behind it.
    let mut cookies = Vec::with_capacity(payload.account_ids.len());
    for account_id in &payload.account_ids {
        let sealed = state
            .storage
            .accounts
            .sealed_cookie(account_id)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    format!("Account not found: {account_id}"),
                )
            })?;

        let cookie = state
            .cipher
            .open(&sealed)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        cookies.push((account_id.clone(), cookie));
    }

    let mut job_ids = Vec::with_capacity(cookies.len());
    for (account_id, cookie) in cookies {
        let job = CampaignJob::new(account_id, cookie, spec.clone());
        state
            .storage
            .queue
            .enqueue(&job)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        job_ids.push(job.id);
    }

    Ok(queued(job_ids))
}

// POST /api/campaigns/run
pub async fn run_campaign_now(
    State(state): State<AppState>,
    Json(payload): Json<RunCampaignRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let spec = CampaignSpec {
        name: payload.campaign_name.clone(),
        profiles: payload.profile_urls.clone(),
        message: payload.message_template.clone(),
        delay_secs: payload.delay_between_messages,
        limit: payload.max_messages_per_day,
    };

    match state.backend.run_campaign(&payload.cookie, &spec).await {
        Ok(result) => Ok(success(result)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

// GET /api/campaigns/{job_id}
pub async fn get_campaign_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    match state.storage.queue.get(&job_id) {
        Ok(Some(job)) => Ok(success(job.redacted())),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Job not found".to_string())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
