//! Sequential batch operations over the credential pool.
//!
//! Every batch is a plain awaited loop: one item at a time, in input order,
//! with a fixed delay between items so the pool core's rate limits are never
//! tripped. Cancellation is a boolean flag checked at each iteration
//! boundary. Per-item failures are caught, recorded, and counted; they never
//! abort the loop.

pub mod import;
pub mod sweep;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use self::import::{ImportItem, parse_import_lines, run_import};
pub use self::sweep::{run_delete_disabled, run_verify_all};

// ---------------------------------------------------------------------------
// Job types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Import,
    VerifyAll,
    DeleteDisabled,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::VerifyAll => write!(f, "verify_all"),
            Self::DeleteDisabled => write!(f, "delete_disabled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    Cancelled,
}

/// How a single item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded,
    Skipped,
    Failed,
    /// Creation succeeded but verification failed; the credential was
    /// disabled and deleted again.
    RolledBack,
    /// Creation succeeded, verification failed, and the rollback itself
    /// failed -- the pool may hold a broken credential.
    RollbackFailed,
}

/// Recorded outcome for one batch item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub index: usize,
    /// Display label: an email, a fingerprint prefix, or a credential id.
    pub label: String,
    pub outcome: ItemOutcome,
    pub detail: String,
}

/// Mutable job bookkeeping behind the handle's mutex.
#[derive(Debug)]
struct JobInner {
    state: JobState,
    total: usize,
    items: Vec<ItemResult>,
    summary: Option<String>,
    finished_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of a job, serialized for the progress endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub kind: JobKind,
    pub state: JobState,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rolled_back: usize,
    pub rollback_failed: usize,
    pub items: Vec<ItemResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Shared handle to a running (or finished) batch job.
pub struct JobHandle {
    pub id: String,
    pub kind: JobKind,
    started_at: DateTime<Utc>,
    cancelled: AtomicBool,
    inner: Mutex<JobInner>,
}

impl JobHandle {
    fn new(kind: JobKind, total: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            started_at: Utc::now(),
            cancelled: AtomicBool::new(false),
            inner: Mutex::new(JobInner {
                state: JobState::Running,
                total,
                items: Vec::new(),
                summary: None,
                finished_at: None,
            }),
        }
    }

    /// Request cancellation. Takes effect at the next iteration boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Record the outcome of one item. Counters are derived from the item
    /// list, so `processed = succeeded + failed + skipped` holds by
    /// construction.
    pub fn record_item(&self, label: &str, outcome: ItemOutcome, detail: impl Into<String>) {
        let mut inner = self.inner.lock().expect("job mutex poisoned");
        let index = inner.items.len();
        inner.items.push(ItemResult {
            index,
            label: label.to_string(),
            outcome,
            detail: detail.into(),
        });
    }

    /// Update the total once it is known (verify/delete sweeps discover it
    /// from the listing after the job has started).
    pub fn set_total(&self, total: usize) {
        let mut inner = self.inner.lock().expect("job mutex poisoned");
        inner.total = total;
    }

    /// Mark the job finished with a human-readable summary line.
    pub fn finish(&self, summary: String) {
        let mut inner = self.inner.lock().expect("job mutex poisoned");
        inner.state = if self.is_cancelled() {
            JobState::Cancelled
        } else {
            JobState::Completed
        };
        inner.summary = Some(summary);
        inner.finished_at = Some(Utc::now());
    }

    pub fn state(&self) -> JobState {
        self.inner.lock().expect("job mutex poisoned").state
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let inner = self.inner.lock().expect("job mutex poisoned");

        let mut succeeded = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut rolled_back = 0;
        let mut rollback_failed = 0;
        for item in &inner.items {
            match item.outcome {
                ItemOutcome::Succeeded => succeeded += 1,
                ItemOutcome::Skipped => skipped += 1,
                ItemOutcome::Failed => failed += 1,
                ItemOutcome::RolledBack => {
                    failed += 1;
                    rolled_back += 1;
                }
                ItemOutcome::RollbackFailed => {
                    failed += 1;
                    rollback_failed += 1;
                }
            }
        }

        JobSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            state: inner.state,
            total: inner.total,
            processed: inner.items.len(),
            succeeded,
            failed,
            skipped,
            rolled_back,
            rollback_failed,
            items: inner.items.clone(),
            summary: inner.summary.clone(),
            started_at: self.started_at,
            finished_at: inner.finished_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All jobs started during this process lifetime, by id.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Arc<JobHandle>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job. Only one job may be running at a time: batches
    /// share the upstream rate budget, so overlapping them would defeat the
    /// per-item delay.
    pub fn start(&self, kind: JobKind, total: usize) -> Result<Arc<JobHandle>, String> {
        let mut jobs = self.jobs.write().expect("registry lock poisoned");

        if let Some(running) = jobs.values().find(|j| j.state() == JobState::Running) {
            return Err(format!(
                "A {} batch is already running (id {})",
                running.kind, running.id
            ));
        }

        let handle = Arc::new(JobHandle::new(kind, total));
        jobs.insert(handle.id.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, id: &str) -> Option<Arc<JobHandle>> {
        self.jobs
            .read()
            .expect("registry lock poisoned")
            .get(id)
            .cloned()
    }
}

/// Sleep the configured inter-item delay, or not at all for the last item.
pub(crate) async fn pace(delay: Duration, index: usize, total: usize) {
    if delay.is_zero() || index + 1 >= total {
        return;
    }
    tokio::time::sleep(delay).await;
}
