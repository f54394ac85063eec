use scanbay_core::queue::TaskEnvelope;
use scanbay_core::{RedisTaskQueue, ScanExecutor, TaskState};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// How long a claim blocks on the queue before re-checking shutdown.
const CLAIM_WAIT: Duration = Duration::from_secs(5);

/// Pause after a queue error before the next claim attempt.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Pool of workers claiming scan tasks from the Redis queue.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

#[derive(Debug)]
struct Worker {
    id: usize,
    handle: tokio::task::JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl WorkerPool {
    pub fn start(worker_count: usize, queue: RedisTaskQueue, executor: ScanExecutor) -> Self {
        let mut workers = Vec::with_capacity(worker_count);

        for id in 0..worker_count {
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
            let queue_clone = queue.clone();
            let executor_clone = executor.clone();

            let handle = tokio::spawn(async move {
                Self::worker_loop(id, queue_clone, executor_clone, shutdown_rx).await;
            });

            workers.push(Worker {
                id,
                handle,
                shutdown_tx,
            });
        }

        info!("Started {} scan workers", worker_count);

        Self { workers }
    }

    /// Main worker loop
    async fn worker_loop(
        id: usize,
        queue: RedisTaskQueue,
        executor: ScanExecutor,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        info!("Worker {} started", id);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Worker {} shutting down", id);
                    break;
                }
                // Shutdown can cancel a claim whose pop already landed
                // an envelope; that task's record then sits Pending
                // until its TTL expires.
                claimed = queue.claim(CLAIM_WAIT) => {
                    match claimed {
                        Ok(Some(envelope)) => {
                            info!("Worker {} processing task {}", id, envelope.task_id);

                            if let Err(e) = queue.mark_running(&envelope).await {
                                warn!(
                                    "Worker {} could not mark task {} running: {}",
                                    id, envelope.task_id, e
                                );
                            }

                            let state = executor.execute(envelope.task_id, &envelope.domain).await;
                            log_outcome(id, &envelope, &state);

                            if let Err(e) = queue.complete(&envelope, state).await {
                                error!(
                                    "Worker {} could not record task {} outcome: {}",
                                    id, envelope.task_id, e
                                );
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!("Worker {} queue claim failed: {}", id, e);
                            tokio::time::sleep(ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }

    /// Shutdown all workers
    pub async fn shutdown(self) {
        info!("Shutting down worker pool");

        for worker in &self.workers {
            let _ = worker.shutdown_tx.send(()).await;
        }

        for worker in self.workers {
            let _ = worker.handle.await;
        }

        info!("Worker pool shutdown complete");
    }
}

fn log_outcome(worker_id: usize, envelope: &TaskEnvelope, state: &TaskState) {
    match state {
        TaskState::Succeeded { .. } => {
            info!(
                task_id = %envelope.task_id,
                domain = %envelope.domain,
                "Worker {} completed scan",
                worker_id
            );
        }
        TaskState::Degraded { detail, .. } => {
            warn!(
                task_id = %envelope.task_id,
                domain = %envelope.domain,
                "Worker {} finished scan without a rendered report: {}",
                worker_id,
                detail
            );
        }
        TaskState::Failed { error } => {
            error!(
                task_id = %envelope.task_id,
                domain = %envelope.domain,
                "Worker {} scan failed: {}",
                worker_id,
                error
            );
        }
        TaskState::Pending | TaskState::Running => {}
    }
}
