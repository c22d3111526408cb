use serde::{Deserialize, Serialize};

/// Inputs for one campaign run. Immutable for the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSpec {
    /// Opaque label, never used for control flow.
    pub name: String,
    /// Profile URLs visited in order.
    pub profiles: Vec<String>,
    /// Sent verbatim, no interpolation.
    pub message: String,
    /// Pause after each successful send, in seconds.
    pub delay_secs: u64,
    /// Maximum number of messages sent before the run stops early.
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Sent,
    DmButtonNotFound,
    Error,
}

/// One record per visited profile, in visitation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOutcome {
    pub url: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProfileOutcome {
    pub fn sent(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::Sent,
            error: None,
        }
    }

    pub fn not_found(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::DmButtonNotFound,
            error: None,
        }
    }

    pub fn error(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::Error,
            error: Some(description.into()),
        }
    }
}

/// Aggregated result of a campaign run.
///
/// `sent` always equals the number of outcomes with status `sent` and
/// never exceeds the configured limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResult {
    pub sent: usize,
    pub results: Vec<ProfileOutcome>,
}
