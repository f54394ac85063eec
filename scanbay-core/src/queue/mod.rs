pub mod task;

use crate::domain::Domain;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub use task::{TaskEnvelope, TaskRecord, TaskState, TaskStatus};

/// The queue operations the submission side depends on.
///
/// The API server only ever submits tasks and polls their state; the
/// worker-facing claim/update operations live on the concrete client.
#[async_trait]
pub trait ScanQueue: Send + Sync {
    /// Enqueue a scan for an already-validated domain and return the
    /// opaque task handle.
    async fn submit(&self, domain: &Domain) -> Result<Uuid>;

    /// Non-blocking read of a task's current state.
    async fn status(&self, task_id: Uuid) -> Result<TaskStatus>;
}

/// Key namespace for everything this service stores in Redis.
#[derive(Debug, Clone, Copy)]
pub struct TaskKeys;

impl TaskKeys {
    pub fn queue() -> String {
        "scanbay:queue".to_string()
    }

    pub fn task(id: Uuid) -> String {
        format!("scanbay:task:{id}")
    }
}

/// Redis-backed task queue client.
///
/// Submission writes the pending state record (with the configured TTL)
/// and pushes an envelope onto the queue list; workers claim with a
/// blocking pop and write state transitions back through the same
/// record key. Terminal records expire via TTL rather than explicit
/// cleanup.
#[derive(Clone)]
pub struct RedisTaskQueue {
    conn: ConnectionManager,
    task_ttl: Duration,
}

impl fmt::Debug for RedisTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTaskQueue")
            .field("connection", &"ConnectionManager")
            .field("task_ttl", &self.task_ttl)
            .finish()
    }
}

impl RedisTaskQueue {
    pub async fn connect(redis_url: &str, task_ttl: Duration) -> Result<Self> {
        info!("Connecting to Redis task queue at {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Successfully connected to Redis task queue");

        Ok(Self { conn, task_ttl })
    }

    async fn put_record(&self, record: &TaskRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(TaskKeys::task(record.id), json, self.task_ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get_record(&self, task_id: Uuid) -> Result<Option<TaskRecord>> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(TaskKeys::task(task_id)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Blocking-pop the next queued task, waiting up to `wait`.
    pub async fn claim(&self, wait: Duration) -> Result<Option<TaskEnvelope>> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> =
            conn.brpop(TaskKeys::queue(), wait.as_secs_f64()).await?;
        match popped {
            Some((_list, json)) => {
                let envelope: TaskEnvelope = serde_json::from_str(&json)?;
                debug!(task_id = %envelope.task_id, domain = %envelope.domain, "Claimed scan task");
                Ok(Some(envelope))
            }
            None => Ok(None),
        }
    }

    /// Record that a claimed task has started running.
    pub async fn mark_running(&self, envelope: &TaskEnvelope) -> Result<()> {
        let mut record = self
            .get_record(envelope.task_id)
            .await?
            .unwrap_or_else(|| TaskRecord::pending(envelope));
        record.start(Utc::now());
        self.put_record(&record).await
    }

    /// Write a task's terminal state.
    pub async fn complete(&self, envelope: &TaskEnvelope, state: TaskState) -> Result<()> {
        let mut record = self
            .get_record(envelope.task_id)
            .await?
            .unwrap_or_else(|| TaskRecord::pending(envelope));
        record.finish(state, Utc::now());
        self.put_record(&record).await
    }
}

#[async_trait]
impl ScanQueue for RedisTaskQueue {
    async fn submit(&self, domain: &Domain) -> Result<Uuid> {
        let envelope = TaskEnvelope {
            task_id: Uuid::new_v4(),
            domain: domain.as_str().to_string(),
            submitted_at: Utc::now(),
        };

        self.put_record(&TaskRecord::pending(&envelope)).await?;

        let json = serde_json::to_string(&envelope)?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(TaskKeys::queue(), json).await?;

        info!(task_id = %envelope.task_id, domain = %envelope.domain, "Scan task submitted");
        Ok(envelope.task_id)
    }

    async fn status(&self, task_id: Uuid) -> Result<TaskStatus> {
        Ok(TaskStatus::from_record(self.get_record(task_id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_keys_are_namespaced() {
        let id = Uuid::new_v4();
        assert_eq!(TaskKeys::queue(), "scanbay:queue");
        assert_eq!(TaskKeys::task(id), format!("scanbay:task:{id}"));
    }
}
