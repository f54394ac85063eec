use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message pushed onto the queue list at submission time.
///
/// Carries everything a worker needs to run the scan, so a claim stays
/// executable even if the state record has already expired. The domain
/// travels as a plain string and is re-validated inside the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_id: Uuid,
    pub domain: String,
    pub submitted_at: DateTime<Utc>,
}

/// Lifecycle of a scan task as persisted in the queue backend.
///
/// `Succeeded` means both artifacts are published; a scan whose
/// structured report could not be rendered terminates as `Degraded`
/// instead, carrying whatever was published plus the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded {
        xml_file: String,
        html_file: String,
    },
    Degraded {
        xml_file: Option<String>,
        detail: String,
    },
    Failed {
        error: String,
    },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded { .. } | TaskState::Degraded { .. } | TaskState::Failed { .. }
        )
    }
}

/// State record stored per task under its identifier key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub domain: String,
    pub status: TaskState,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn pending(envelope: &TaskEnvelope) -> Self {
        Self {
            id: envelope.task_id,
            domain: envelope.domain.clone(),
            status: TaskState::Pending,
            submitted_at: envelope.submitted_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// Move the record to `Running`, stamping the start time.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = TaskState::Running;
        self.started_at = Some(now);
    }

    /// Move the record to a terminal state, stamping the finish time.
    pub fn finish(&mut self, state: TaskState, now: DateTime<Utc>) {
        self.status = state;
        self.finished_at = Some(now);
    }
}

/// Task state as observed through a status query.
///
/// Identical to [`TaskState`] plus `Unknown`, which covers identifiers
/// the backend has no record for (expired or never submitted) and is
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded {
        xml_file: String,
        html_file: String,
    },
    Degraded {
        xml_file: Option<String>,
        detail: String,
    },
    Failed {
        error: String,
    },
    Unknown,
}

impl TaskStatus {
    pub fn from_record(record: Option<TaskRecord>) -> Self {
        match record {
            None => TaskStatus::Unknown,
            Some(record) => match record.status {
                TaskState::Pending => TaskStatus::Pending,
                TaskState::Running => TaskStatus::Running,
                TaskState::Succeeded {
                    xml_file,
                    html_file,
                } => TaskStatus::Succeeded {
                    xml_file,
                    html_file,
                },
                TaskState::Degraded { xml_file, detail } => {
                    TaskStatus::Degraded { xml_file, detail }
                }
                TaskState::Failed { error } => TaskStatus::Failed { error },
            },
        }
    }
}
