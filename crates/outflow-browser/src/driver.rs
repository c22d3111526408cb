use anyhow::Result;
use async_trait::async_trait;
use outflow_models::ReplyRecord;

/// What a single delivery attempt observed on the profile page.
///
/// Transport failures (navigation error, render timeout, crashed
/// page) surface as `Err` from [`SessionDriver::deliver`]; the
/// campaign loop turns them into an `error` outcome and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Composer trigger found, message typed and submitted.
    Sent,
    /// No message-initiation control on the rendered page.
    ComposerNotFound,
}

/// Seam between the campaign state machine and the browser.
///
/// One driver owns one authenticated browsing session exclusively for
/// the duration of one operation. Implementations must release all
/// browser resources by the time `close` returns (or on drop).
#[async_trait]
pub trait SessionDriver: Send {
    /// One isolated attempt against one profile: navigate, settle,
    /// locate the composer trigger, type the literal message, submit.
    async fn deliver(&mut self, profile_url: &str, message: &str) -> Result<Delivery>;

    /// Read up to `cap` rendered conversation-list items from the
    /// workspace client view and return those carrying a reply marker.
    async fn scan_replies(&mut self, cap: usize) -> Result<Vec<ReplyRecord>>;

    /// Tear down the browsing session.
    async fn close(&mut self) -> Result<()>;
}
