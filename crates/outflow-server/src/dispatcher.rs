//! Worker pool that drains the campaign job queue.
//!
//! Each worker pops one job at a time, runs the campaign with its own
//! isolated browser session and writes the result (or the
//! initialization error) back onto the completed record. Campaigns
//! never share a session; parallelism comes only from independent
//! workers.

use crate::backend::SessionBackend;
use outflow_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Jobs stuck in processing longer than this are re-queued at startup.
const STALL_TIMEOUT_MS: i64 = 30 * 60 * 1000;
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct CampaignDispatcher {
    storage: Arc<Storage>,
    backend: Arc<dyn SessionBackend>,
    num_workers: usize,
    running: Arc<Mutex<bool>>,
}

impl CampaignDispatcher {
    pub fn new(storage: Arc<Storage>, backend: Arc<dyn SessionBackend>, num_workers: usize) -> Self {
        Self {
            storage,
            backend,
            num_workers,
            running: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn start(&self) {
        if !self.try_start().await {
            return;
        }

        match self.storage.queue.recover_stalled(STALL_TIMEOUT_MS) {
            Ok(0) => {}
            Ok(recovered) => info!(recovered, "re-queued stalled campaign jobs"),
            Err(e) => error!(error = %e, "failed to recover stalled jobs"),
        }

        info!(num_workers = self.num_workers, "starting campaign workers");
        for worker_id in 0..self.num_workers {
            let storage = self.storage.clone();
            let backend = self.backend.clone();
            let running = self.running.clone();

            tokio::spawn(async move {
                run_worker_loop(worker_id, storage, backend, running).await;
            });
        }
    }

    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        *running = false;
    }

    async fn try_start(&self) -> bool {
        let mut running = self.running.lock().await;
        if *running {
            return false;
        }
        *running = true;
        true
    }
}

async fn run_worker_loop(
    worker_id: usize,
    storage: Arc<Storage>,
    backend: Arc<dyn SessionBackend>,
    running: Arc<Mutex<bool>>,
) {
    loop {
        if !*running.lock().await {
            break;
        }

        match storage.queue.dequeue() {
            Ok(Some(job)) => {
                info!(worker_id, job_id = %job.id, campaign = %job.spec.name, "picked up campaign job");
                let outcome = backend.run_campaign(&job.cookie, &job.spec).await;

                let store_result = match outcome {
                    Ok(result) => {
                        info!(worker_id, job_id = %job.id, sent = result.sent, "campaign finished");
                        storage.queue.complete(&job.id, result)
                    }
                    Err(e) => {
                        warn!(worker_id, job_id = %job.id, error = %e, "campaign failed to initialize");
                        storage.queue.fail(&job.id, e.to_string())
                    }
                };
                if let Err(e) = store_result {
                    error!(worker_id, job_id = %job.id, error = %e, "failed to record job outcome");
                }
            }
            Ok(None) => {
                // Idle poll backstops a wakeup lost across stop/start.
                tokio::select! {
                    _ = storage.queue.wait_for_job() => {}
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                }
            }
            Err(e) => {
                error!(worker_id, error = %e, "failed to pop campaign job");
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            }
        }
    }
}
