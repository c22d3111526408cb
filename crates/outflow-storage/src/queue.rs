//! Campaign job queue - three-table design over redb.
//!
//! Separate pending/processing/completed tables keep the pop path
//! O(1). Pending keys are "{submitted_ms:020}:{job_id}" so iteration
//! order is submission order (campaigns are FIFO).

use anyhow::{Result, anyhow};
use outflow_models::{CampaignJob, CampaignResult, JobStatus};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

const PENDING: TableDefinition<&str, &[u8]> = TableDefinition::new("pending_jobs");
const PROCESSING: TableDefinition<&str, &[u8]> = TableDefinition::new("processing_jobs");
const COMPLETED: TableDefinition<&str, &[u8]> = TableDefinition::new("completed_jobs");

#[derive(Clone)]
pub struct CampaignQueue {
    db: Arc<Database>,
    notify: Arc<Notify>,
    /// Tracks pending jobs so waiters never miss a wakeup.
    pending_count: Arc<AtomicUsize>,
}

impl CampaignQueue {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(PENDING)?;
        write_txn.open_table(PROCESSING)?;
        write_txn.open_table(COMPLETED)?;
        write_txn.commit()?;

        let pending_count = {
            let read_txn = db.begin_read()?;
            let pending = read_txn.open_table(PENDING)?;
            pending.len()? as usize
        };

        Ok(Self {
            db,
            notify: Arc::new(Notify::new()),
            pending_count: Arc::new(AtomicUsize::new(pending_count)),
        })
    }

    pub fn enqueue(&self, job: &CampaignJob) -> Result<()> {
        let serialized = serde_json::to_vec(job)?;
        let key = pending_key(job);

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PENDING)?;
            table.insert(key.as_str(), serialized.as_slice())?;
        }
        write_txn.commit()?;
        self.pending_count.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
        Ok(())
    }

    /// Atomically pops the oldest pending job, marks it running and
    /// moves it to processing. `None` when the queue is empty.
    pub fn dequeue(&self) -> Result<Option<CampaignJob>> {
        let write_txn = self.db.begin_write()?;

        let popped = {
            let mut pending = write_txn.open_table(PENDING)?;

            let first_entry = if let Some(first) = pending.first()? {
                Some((first.0.value().to_string(), first.1.value().to_vec()))
            } else {
                None
            };

            if let Some((key, data)) = first_entry {
                pending.remove(key.as_str())?;

                let mut job: CampaignJob = serde_json::from_slice(&data)?;
                job.start();
                let serialized = serde_json::to_vec(&job)?;

                let mut processing = write_txn.open_table(PROCESSING)?;
                processing.insert(job.id.as_str(), serialized.as_slice())?;

                Some(job)
            } else {
                None
            }
        };

        if popped.is_some() {
            write_txn.commit()?;
            self.pending_count.fetch_sub(1, Ordering::SeqCst);
        } else {
            write_txn.abort()?;
        }

        Ok(popped)
    }

    /// Blocks until at least one pending job exists.
    pub async fn wait_for_job(&self) {
        if self.pending_count.load(Ordering::SeqCst) > 0 {
            return;
        }
        self.notify.notified().await;
    }

    pub fn has_pending(&self) -> bool {
        self.pending_count.load(Ordering::SeqCst) > 0
    }

    pub fn complete(&self, job_id: &str, result: CampaignResult) -> Result<()> {
        self.finish(job_id, |job| job.complete(result))
    }

    pub fn fail(&self, job_id: &str, error: String) -> Result<()> {
        self.finish(job_id, |job| job.fail(error))
    }

    fn finish<F>(&self, job_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut CampaignJob),
    {
        let write_txn = self.db.begin_write()?;
        {
            let mut processing = write_txn.open_table(PROCESSING)?;
            let data = processing
                .remove(job_id)?
                .ok_or_else(|| anyhow!("Job not in processing: {}", job_id))?
                .value()
                .to_vec();

            let mut job: CampaignJob = serde_json::from_slice(&data)?;
            apply(&mut job);
            let serialized = serde_json::to_vec(&job)?;

            let mut completed = write_txn.open_table(COMPLETED)?;
            completed.insert(job_id, serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Looks a job up in whichever table currently holds it.
    pub fn get(&self, job_id: &str) -> Result<Option<CampaignJob>> {
        let read_txn = self.db.begin_read()?;

        let processing = read_txn.open_table(PROCESSING)?;
        if let Some(data) = processing.get(job_id)? {
            return Ok(Some(serde_json::from_slice(data.value())?));
        }

        let completed = read_txn.open_table(COMPLETED)?;
        if let Some(data) = completed.get(job_id)? {
            return Ok(Some(serde_json::from_slice(data.value())?));
        }

        let pending = read_txn.open_table(PENDING)?;
        for entry in pending.iter()? {
            let (_, value) = entry?;
            let job: CampaignJob = serde_json::from_slice(value.value())?;
            if job.id == job_id {
                return Ok(Some(job));
            }
        }

        Ok(None)
    }

    /// Moves jobs stuck in processing longer than `stall_timeout_ms`
    /// back to pending. Run at startup before workers spawn.
    pub fn recover_stalled(&self, stall_timeout_ms: i64) -> Result<u32> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut recovered = 0;

        let stalled: Vec<CampaignJob> = {
            let read_txn = self.db.begin_read()?;
            let processing = read_txn.open_table(PROCESSING)?;
            let mut jobs = Vec::new();
            for entry in processing.iter()? {
                let (_, value) = entry?;
                let job: CampaignJob = serde_json::from_slice(value.value())?;
                if let Some(started_at) = job.started_at
                    && now - started_at > stall_timeout_ms
                {
                    jobs.push(job);
                }
            }
            jobs
        };

        for mut job in stalled {
            let write_txn = self.db.begin_write()?;
            {
                let mut processing = write_txn.open_table(PROCESSING)?;
                processing.remove(job.id.as_str())?;

                job.status = JobStatus::Pending;
                job.started_at = None;
                let serialized = serde_json::to_vec(&job)?;
                let key = pending_key(&job);

                let mut pending = write_txn.open_table(PENDING)?;
                pending.insert(key.as_str(), serialized.as_slice())?;
            }
            write_txn.commit()?;
            self.pending_count.fetch_add(1, Ordering::SeqCst);
            recovered += 1;
        }

        if recovered > 0 {
            tracing::info!("Moved {} stalled jobs back to pending", recovered);
            self.notify.notify_waiters();
        }
        Ok(recovered)
    }
}

fn pending_key(job: &CampaignJob) -> String {
    format!("{:020}:{}", job.submitted_at, job.id)
}
