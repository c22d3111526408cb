//! Shared data model for Outflow.
//!
//! Everything that crosses a crate boundary lives here: the campaign
//! specification, per-profile outcomes, queued job records and the
//! workspace account shape stored by the service.

pub mod account;
pub mod campaign;
pub mod job;
pub mod reply;

pub use account::WorkspaceAccount;
pub use campaign::{CampaignResult, CampaignSpec, OutcomeStatus, ProfileOutcome};
pub use job::{CampaignJob, JobStatus};
pub use reply::ReplyRecord;
