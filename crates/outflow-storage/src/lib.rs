//! Persistence for the Outflow service: workspace accounts with
//! encrypted cookies and the campaign job queue, both on one redb
//! database.

pub mod accounts;
pub mod encryption;
pub mod queue;

pub use accounts::AccountStore;
pub use encryption::CredentialCipher;
pub use queue::CampaignQueue;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub struct Storage {
    pub accounts: AccountStore,
    pub queue: CampaignQueue,
}

impl Storage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let accounts = AccountStore::new(db.clone())?;
        let queue = CampaignQueue::new(db)?;

        Ok(Self { accounts, queue })
    }
}
