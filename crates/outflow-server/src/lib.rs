//! HTTP service wrapping the Outflow automation core: account
//! storage with encrypted cookies, queued campaign dispatch through a
//! worker pool, a synchronous campaign endpoint and the reply scan.

pub mod api;
pub mod api_response;
pub mod backend;
pub mod config;
pub mod dispatcher;

use crate::api::AppState;
use crate::backend::{PlaywrightBackend, SessionBackend};
use crate::config::ServiceConfig;
use crate::dispatcher::CampaignDispatcher;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{delete, get, post},
};
use outflow_storage::{CredentialCipher, Storage};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Everything a running service needs, wired from one config.
pub struct App {
    pub state: AppState,
    pub dispatcher: Arc<CampaignDispatcher>,
}

pub fn build(config: &ServiceConfig) -> Result<App> {
    let storage = Arc::new(Storage::new(&config.db_path)?);
    let cipher = Arc::new(CredentialCipher::from_base64_key(&config.master_key_b64)?);
    let backend: Arc<dyn SessionBackend> = Arc::new(PlaywrightBackend::new(config.pacing));

    let dispatcher = Arc::new(CampaignDispatcher::new(
        storage.clone(),
        backend.clone(),
        config.worker_count,
    ));

    Ok(App {
        state: AppState::new(storage, cipher, backend),
        dispatcher,
    })
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/health", get(api::runtime::health))
        .route("/api/runtime", get(api::runtime::probe))
        .route(
            "/api/accounts",
            post(api::accounts::add_account).get(api::accounts::list_accounts),
        )
        .route("/api/accounts/{id}", delete(api::accounts::delete_account))
        .route("/api/campaigns", post(api::campaigns::create_campaign))
        .route("/api/campaigns/run", post(api::campaigns::run_campaign_now))
        .route("/api/campaigns/{id}", get(api::campaigns::get_campaign_job))
        .route("/api/replies", get(api::replies::get_replies))
        .layer(cors)
        .with_state(state))
}
