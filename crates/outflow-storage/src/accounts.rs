//! Workspace account storage. Cookies arrive already sealed by the
//! service layer; this module never sees plaintext credential material.

use anyhow::Result;
use outflow_models::WorkspaceAccount;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ACCOUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("workspace_accounts");

#[derive(Debug, Serialize, Deserialize)]
struct AccountRow {
    account: WorkspaceAccount,
    sealed_cookie: String,
}

#[derive(Clone)]
pub struct AccountStore {
    db: Arc<Database>,
}

impl AccountStore {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(ACCOUNTS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn insert(&self, account: &WorkspaceAccount, sealed_cookie: &str) -> Result<()> {
        let row = AccountRow {
            account: account.clone(),
            sealed_cookie: sealed_cookie.to_string(),
        };
        let serialized = serde_json::to_vec(&row)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE)?;
            table.insert(account.id.as_str(), serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, account_id: &str) -> Result<Option<WorkspaceAccount>> {
        Ok(self.get_row(account_id)?.map(|row| row.account))
    }

    /// The encrypted cookie blob for one account, still sealed.
    pub fn sealed_cookie(&self, account_id: &str) -> Result<Option<String>> {
        Ok(self.get_row(account_id)?.map(|row| row.sealed_cookie))
    }

    /// All accounts, oldest first. Cookie material is not included.
    pub fn list(&self) -> Result<Vec<WorkspaceAccount>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS_TABLE)?;

        let mut accounts = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let row: AccountRow = serde_json::from_slice(value.value())?;
            accounts.push(row.account);
        }
        accounts.sort_by_key(|account| account.created_at);
        Ok(accounts)
    }

    pub fn delete(&self, account_id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE)?;
            table.remove(account_id)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn get_row(&self, account_id: &str) -> Result<Option<AccountRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS_TABLE)?;

        if let Some(data) = table.get(account_id)? {
            Ok(Some(serde_json::from_slice(data.value())?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (AccountStore, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        let store = AccountStore::new(db).unwrap();
        (store, temp_dir)
    }

    fn account(name: &str) -> WorkspaceAccount {
        WorkspaceAccount::new(
            "user-1".into(),
            name.into(),
            "acme-workspace".into(),
            25,
        )
    }

    #[test]
    fn insert_and_fetch() {
        let (store, _temp_dir) = setup();
        let acct = account("outreach-main");

        store.insert(&acct, "sealed-blob").unwrap();

        let fetched = store.get(&acct.id).unwrap().unwrap();
        assert_eq!(fetched.account_name, "outreach-main");
        assert_eq!(
            store.sealed_cookie(&acct.id).unwrap().as_deref(),
            Some("sealed-blob")
        );
    }

    #[test]
    fn list_excludes_cookie_material() {
        let (store, _temp_dir) = setup();
        store.insert(&account("a"), "blob-a").unwrap();
        store.insert(&account("b"), "blob-b").unwrap();

        let accounts = store.list().unwrap();
        assert_eq!(accounts.len(), 2);
        let json = serde_json::to_string(&accounts).unwrap();
        assert!(!json.contains("blob-a"));
        assert!(!json.contains("sealed"));
    }

    #[test]
    fn delete_reports_presence() {
        let (store, _temp_dir) = setup();
        let acct = account("gone");
        store.insert(&acct, "blob").unwrap();

        assert!(store.delete(&acct.id).unwrap());
        assert!(!store.delete(&acct.id).unwrap());
        assert!(store.get(&acct.id).unwrap().is_none());
    }

    #[test]
    fn missing_account_is_none() {
        let (store, _temp_dir) = setup();
        assert!(store.get("nope").unwrap().is_none());
        assert!(store.sealed_cookie("nope").unwrap().is_none());
    }
}
