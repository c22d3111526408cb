use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored workspace account. The session cookie is encrypted before
/// it reaches storage and never appears on this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceAccount {
    pub id: String,
    pub user_id: String,
    pub account_name: String,
    pub workspace: String,
    pub daily_limit: usize,
    pub created_at: i64,
}

impl WorkspaceAccount {
    pub fn new(
        user_id: String,
        account_name: String,
        workspace: String,
        daily_limit: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            account_name,
            workspace,
            daily_limit,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
