use crate::campaign::{CampaignResult, CampaignSpec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A queued campaign run for one workspace account.
///
/// Carries the decrypted cookie for the duration of the job; job
/// records are the only place cookie material transits the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignJob {
    pub id: String,
    pub account_id: String,
    pub cookie: String,
    pub spec: CampaignSpec,
    pub status: JobStatus,
    pub submitted_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub result: Option<CampaignResult>,
    pub error: Option<String>,
}

impl CampaignJob {
    pub fn new(account_id: String, cookie: String, spec: CampaignSpec) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            cookie,
            spec,
            status: JobStatus::Pending,
            submitted_at: chrono::Utc::now().timestamp_millis(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(chrono::Utc::now().timestamp_millis());
    }

    pub fn complete(&mut self, result: CampaignResult) {
        self.status = JobStatus::Completed;
        self.finished_at = Some(chrono::Utc::now().timestamp_millis());
        self.result = Some(result);
    }

    pub fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.finished_at = Some(chrono::Utc::now().timestamp_millis());
        self.error = Some(error);
    }

    /// View safe to return from status endpoints: cookie redacted.
    pub fn redacted(&self) -> CampaignJob {
        CampaignJob {
            cookie: String::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CampaignSpec {
        CampaignSpec {
            name: "launch".into(),
            profiles: vec!["https://example.com/u/1".into()],
            message: "hi".into(),
            delay_secs: 0,
            limit: 1,
        }
    }

    #[test]
    fn lifecycle_transitions() {
        let mut job = CampaignJob::new("acct-1".into(), "d=1".into(), spec());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.started_at.is_none());

        job.start();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.started_at.is_some());

        job.fail("browser runtime unavailable".into());
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.finished_at.is_some());
        assert_eq!(job.error.as_deref(), Some("browser runtime unavailable"));
    }

    #[test]
    fn redacted_drops_cookie_only() {
        let mut job = CampaignJob::new("acct-1".into(), "d=secret".into(), spec());
        job.start();
        let view = job.redacted();
        assert!(view.cookie.is_empty());
        assert_eq!(view.id, job.id);
        assert_eq!(view.status, JobStatus::Running);
    }
}
