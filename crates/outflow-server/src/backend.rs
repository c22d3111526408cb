//! Seam between the HTTP/dispatch layer and the browser automation
//! core, so handlers and workers can be tested without a browser.

use anyhow::Result;
use async_trait::async_trait;
use outflow_browser::Pacing;
use outflow_models::{CampaignResult, CampaignSpec, ReplyRecord};

#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// One full campaign run against a fresh authenticated session.
    /// Per-profile failures are already folded into the result; an
    /// `Err` here means initialization failed.
    async fn run_campaign(&self, cookie: &str, spec: &CampaignSpec) -> Result<CampaignResult>;

    /// One reply scan against a fresh authenticated session.
    async fn fetch_replies(&self, cookie: &str) -> Result<Vec<ReplyRecord>>;
}

pub struct PlaywrightBackend {
    pacing: Pacing,
}

impl PlaywrightBackend {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }
}

#[async_trait]
impl SessionBackend for PlaywrightBackend {
    async fn run_campaign(&self, cookie: &str, spec: &CampaignSpec) -> Result<CampaignResult> {
        outflow_browser::run_campaign(cookie, spec, &self.pacing).await
    }

    async fn fetch_replies(&self, cookie: &str) -> Result<Vec<ReplyRecord>> {
        outflow_browser::fetch_replies(cookie, &self.pacing).await
    }
}
