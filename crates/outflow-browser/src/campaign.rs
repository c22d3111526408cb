//! The campaign execution loop and the reply scan.
//!
//! Both functions are generic over [`SessionDriver`] so the state
//! machine can be exercised without a browser.

use crate::driver::{Delivery, SessionDriver};
use outflow_models::{CampaignResult, CampaignSpec, ProfileOutcome, ReplyRecord};
use std::time::Duration;
use tracing::{info, warn};

/// Hard ceiling on conversation-list items inspected per scan.
pub const REPLY_SCAN_CAP: usize = 10;

/// Walks the profile list in order and aggregates one outcome per
/// visited profile.
///
/// A profile failure never aborts the run: the driver's error becomes
/// an `error` outcome and the loop continues. The loop stops as soon
/// as `sent` reaches the configured limit; unvisited profiles produce
/// no outcome. The inter-message delay applies only after a
/// successful send.
pub async fn execute_campaign(driver: &mut dyn SessionDriver, spec: &CampaignSpec) -> CampaignResult {
    let mut sent = 0usize;
    let mut results = Vec::new();

    for profile_url in &spec.profiles {
        if sent >= spec.limit {
            break;
        }

        match driver.deliver(profile_url, &spec.message).await {
            Ok(Delivery::Sent) => {
                sent += 1;
                info!(campaign = %spec.name, url = %profile_url, sent, "message sent");
                results.push(ProfileOutcome::sent(profile_url));
                if spec.delay_secs > 0 {
                    tokio::time::sleep(Duration::from_secs(spec.delay_secs)).await;
                }
            }
            Ok(Delivery::ComposerNotFound) => {
                info!(campaign = %spec.name, url = %profile_url, "dm button not found");
                results.push(ProfileOutcome::not_found(profile_url));
            }
            Err(error) => {
                warn!(campaign = %spec.name, url = %profile_url, %error, "profile attempt failed");
                results.push(ProfileOutcome::error(profile_url, error.to_string()));
            }
        }
    }

    CampaignResult { sent, results }
}

/// Scans the workspace client view for threads with reply markers.
/// Items the driver could not read are already skipped on its side;
/// the cap is enforced here as well as in the driver.
pub async fn collect_replies(driver: &mut dyn SessionDriver) -> anyhow::Result<Vec<ReplyRecord>> {
    let mut replies = driver.scan_replies(REPLY_SCAN_CAP).await?;
    replies.truncate(REPLY_SCAN_CAP);
    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use outflow_models::OutcomeStatus;

    /// Scripted driver: one reaction per expected delivery attempt.
    enum Attempt {
        Sent,
        NotFound,
        Fail(&'static str),
    }

    struct ScriptedDriver {
        attempts: Vec<Attempt>,
        calls: usize,
        replies: Vec<ReplyRecord>,
    }

    impl ScriptedDriver {
        fn new(attempts: Vec<Attempt>) -> Self {
            Self {
                attempts,
                calls: 0,
                replies: Vec::new(),
            }
        }

        fn with_replies(replies: Vec<ReplyRecord>) -> Self {
            Self {
                attempts: Vec::new(),
                calls: 0,
                replies,
            }
        }
    }

    #[async_trait]
    impl SessionDriver for ScriptedDriver {
        async fn deliver(&mut self, _url: &str, _message: &str) -> anyhow::Result<Delivery> {
            let attempt = &self.attempts[self.calls];
            self.calls += 1;
            match attempt {
                Attempt::Sent => Ok(Delivery::Sent),
                Attempt::NotFound => Ok(Delivery::ComposerNotFound),
                Attempt::Fail(message) => Err(anyhow!(*message)),
            }
        }

        async fn scan_replies(&mut self, cap: usize) -> anyhow::Result<Vec<ReplyRecord>> {
            self.calls += 1;
            Ok(self.replies.iter().take(cap).cloned().collect())
        }

        async fn close(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn spec(profiles: usize, limit: usize) -> CampaignSpec {
        CampaignSpec {
            name: "test".into(),
            profiles: (0..profiles)
                .map(|i| format!("https://workspace.example/team/U{i:03}"))
                .collect(),
            message: "hello there".into(),
            delay_secs: 0,
            limit,
        }
    }

    #[tokio::test]
    async fn all_profiles_sent_in_order() {
        let mut driver =
            ScriptedDriver::new(vec![Attempt::Sent, Attempt::Sent, Attempt::Sent]);
        let spec = spec(3, 10);
        let result = execute_campaign(&mut driver, &spec).await;

        assert_eq!(result.sent, 3);
        assert_eq!(result.results.len(), 3);
        for (outcome, url) in result.results.iter().zip(&spec.profiles) {
            assert_eq!(outcome.status, OutcomeStatus::Sent);
            assert_eq!(&outcome.url, url);
        }
    }

    #[tokio::test]
    async fn zero_limit_visits_nothing() {
        let mut driver = ScriptedDriver::new(vec![]);
        let result = execute_campaign(&mut driver, &spec(5, 0)).await;

        assert_eq!(result.sent, 0);
        assert!(result.results.is_empty());
        assert_eq!(driver.calls, 0);
    }

    #[tokio::test]
    async fn stops_when_limit_reached_mid_list() {
        let mut driver = ScriptedDriver::new(vec![Attempt::Sent, Attempt::Sent]);
        let result = execute_campaign(&mut driver, &spec(5, 2)).await;

        assert_eq!(result.sent, 2);
        // Remaining profiles are never visited and never recorded.
        assert_eq!(result.results.len(), 2);
        assert_eq!(driver.calls, 2);
    }

    #[tokio::test]
    async fn missing_composer_does_not_halt_the_run() {
        let mut driver =
            ScriptedDriver::new(vec![Attempt::Sent, Attempt::NotFound, Attempt::Sent]);
        let result = execute_campaign(&mut driver, &spec(3, 10)).await;

        assert_eq!(result.sent, 2);
        assert_eq!(result.results[1].status, OutcomeStatus::DmButtonNotFound);
        assert!(result.results[1].error.is_none());
        assert_eq!(result.results[2].status, OutcomeStatus::Sent);
    }

    #[tokio::test]
    async fn driver_failure_becomes_error_outcome() {
        let mut driver = ScriptedDriver::new(vec![
            Attempt::Fail("navigation timed out"),
            Attempt::Sent,
        ]);
        let result = execute_campaign(&mut driver, &spec(2, 10)).await;

        assert_eq!(result.sent, 1);
        assert_eq!(result.results[0].status, OutcomeStatus::Error);
        let description = result.results[0].error.as_deref().unwrap();
        assert!(!description.is_empty());
        assert!(description.contains("navigation timed out"));
        assert_eq!(result.results[1].status, OutcomeStatus::Sent);
    }

    #[tokio::test]
    async fn sent_count_matches_sent_outcomes_and_limit() {
        let mut driver = ScriptedDriver::new(vec![
            Attempt::Sent,
            Attempt::Fail("boom"),
            Attempt::Sent,
            Attempt::NotFound,
            Attempt::Sent,
        ]);
        let spec = spec(5, 3);
        let result = execute_campaign(&mut driver, &spec).await;

        let sent_outcomes = result
            .results
            .iter()
            .filter(|o| o.status == OutcomeStatus::Sent)
            .count();
        assert_eq!(result.sent, sent_outcomes);
        assert!(result.sent <= spec.limit);
    }

    #[tokio::test]
    async fn reply_scan_respects_cap_and_is_deterministic() {
        let records: Vec<ReplyRecord> = (0..15)
            .map(|i| ReplyRecord {
                message: format!("Alice replied to thread {i}"),
            })
            .collect();

        let mut driver = ScriptedDriver::with_replies(records.clone());
        let first = collect_replies(&mut driver).await.unwrap();
        assert_eq!(first.len(), REPLY_SCAN_CAP);

        let mut driver = ScriptedDriver::with_replies(records);
        let second = collect_replies(&mut driver).await.unwrap();
        assert_eq!(first, second);
    }
}
