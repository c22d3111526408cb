//! Session lifecycle: one authenticated browsing session per
//! operation, with unconditional teardown.

use crate::campaign::{collect_replies, execute_campaign};
use crate::driver::SessionDriver;
use crate::playwright::PlaywrightDriver;
use anyhow::Result;
use outflow_models::{CampaignResult, CampaignSpec, ReplyRecord};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fixed pauses that stand in for a page-rendered signal.
///
/// These are a fallback synchronization primitive, not a readiness
/// protocol: the page gets a fixed window to render dynamic content
/// before the next action. Tune per deployment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pacing {
    /// Wait after navigating to a profile, in milliseconds.
    pub profile_settle_ms: u64,
    /// Wait after activating the composer trigger.
    pub composer_settle_ms: u64,
    /// Wait for the virtualized conversation list to populate.
    pub replies_settle_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            profile_settle_ms: 3000,
            composer_settle_ms: 1000,
            replies_settle_ms: 5000,
        }
    }
}

/// An authenticated browsing session, good for exactly one operation.
///
/// The operation methods consume the session and close the driver on
/// every path; the driver's own drop guard covers the paths that never
/// reach `close`.
pub struct Session<D: SessionDriver> {
    driver: D,
}

impl Session<PlaywrightDriver> {
    /// Launches a fresh isolated browser and injects the cookies
    /// parsed from `cookie`. The only fatal error in the whole flow.
    pub async fn open(cookie: &str, pacing: &Pacing) -> Result<Self> {
        let driver = PlaywrightDriver::launch(cookie, pacing).await?;
        Ok(Self { driver })
    }
}

impl<D: SessionDriver> Session<D> {
    pub fn with_driver(driver: D) -> Self {
        Self { driver }
    }

    /// Runs the campaign loop, then tears the session down.
    pub async fn run_campaign(mut self, spec: &CampaignSpec) -> CampaignResult {
        let result = execute_campaign(&mut self.driver, spec).await;
        self.shutdown().await;
        result
    }

    /// Scans the client view for reply markers, then tears down.
    pub async fn fetch_replies(mut self) -> Result<Vec<ReplyRecord>> {
        let replies = collect_replies(&mut self.driver).await;
        self.shutdown().await;
        replies
    }

    async fn shutdown(&mut self) {
        if let Err(error) = self.driver.close().await {
            warn!(%error, "browser session teardown failed");
        }
    }
}

/// Runs one campaign end to end: open session, execute, tear down.
/// Per-profile failures become outcomes; only initialization fails.
pub async fn run_campaign(
    cookie: &str,
    spec: &CampaignSpec,
    pacing: &Pacing,
) -> Result<CampaignResult> {
    let session = Session::open(cookie, pacing).await?;
    Ok(session.run_campaign(spec).await)
}

/// Fetches reply-marked threads with a fresh session.
pub async fn fetch_replies(cookie: &str, pacing: &Pacing) -> Result<Vec<ReplyRecord>> {
    let session = Session::open(cookie, pacing).await?;
    session.fetch_replies().await
}
