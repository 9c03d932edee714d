use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::batch::{
    JobKind, JobSnapshot, parse_import_lines, run_delete_disabled, run_import, run_verify_all,
};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartImportRequest {
    /// Pasted import text: one `token` or `token,email` per line.
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct StartedResponse {
    pub id: String,
    pub kind: JobKind,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelledResponse {
    pub id: String,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /admin/batches/import
pub async fn start_import(
    State(state): State<AppState>,
    Json(body): Json<StartImportRequest>,
) -> Result<Json<StartedResponse>, AppError> {
    let items = parse_import_lines(&body.text);
    if items.is_empty() {
        return Err(AppError::BadRequest(
            "No import items found: expected one token per line".to_string(),
        ));
    }

    let job = state
        .jobs
        .start(JobKind::Import, items.len())
        .map_err(AppError::BadRequest)?;

    tracing::info!(job = %job.id, items = items.len(), "Import batch started");

    let delay = Duration::from_millis(state.config.batch.item_delay_ms);
    tokio::spawn(run_import(
        state.pool.clone(),
        job.clone(),
        items,
        delay,
        state.audit_tx.clone(),
    ));

    Ok(Json(StartedResponse {
        id: job.id.clone(),
        kind: job.kind,
        total: job.snapshot().total,
    }))
}

/// POST /admin/batches/verify
pub async fn start_verify_all(
    State(state): State<AppState>,
) -> Result<Json<StartedResponse>, AppError> {
    start_sweep(state, JobKind::VerifyAll).await
}

/// POST /admin/batches/delete-disabled
pub async fn start_delete_disabled(
    State(state): State<AppState>,
) -> Result<Json<StartedResponse>, AppError> {
    start_sweep(state, JobKind::DeleteDisabled).await
}

async fn start_sweep(state: AppState, kind: JobKind) -> Result<Json<StartedResponse>, AppError> {
    // The sweep discovers its total from the listing once it runs.
    let job = state.jobs.start(kind, 0).map_err(AppError::BadRequest)?;

    tracing::info!(job = %job.id, kind = %kind, "Sweep batch started");

    let delay = Duration::from_millis(state.config.batch.item_delay_ms);
    match kind {
        JobKind::VerifyAll => {
            tokio::spawn(run_verify_all(
                state.pool.clone(),
                job.clone(),
                delay,
                state.audit_tx.clone(),
            ));
        }
        JobKind::DeleteDisabled => {
            tokio::spawn(run_delete_disabled(
                state.pool.clone(),
                job.clone(),
                delay,
                state.audit_tx.clone(),
            ));
        }
        JobKind::Import => unreachable!("imports go through start_import"),
    }

    Ok(Json(StartedResponse {
        id: job.id.clone(),
        kind: job.kind,
        total: 0,
    }))
}

/// GET /admin/batches/{id}
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, AppError> {
    let job = state
        .jobs
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Batch '{id}' not found")))?;
    Ok(Json(job.snapshot()))
}

/// POST /admin/batches/{id}/cancel
pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelledResponse>, AppError> {
    let job = state
        .jobs
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Batch '{id}' not found")))?;

    job.cancel();
    tracing::info!(job = %id, "Batch cancellation requested");

    Ok(Json(CancelledResponse { id, cancelled: true }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::batch::JobState;
    use crate::test_support::{FakePool, test_state_with_pool};

    /// Poll a job until it leaves the Running state.
    async fn wait_for_finish(state: &AppState, id: &str) -> JobSnapshot {
        for _ in 0..200 {
            let job = state.jobs.get(id).unwrap();
            if job.state() != JobState::Running {
                return job.snapshot();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("batch {id} did not finish in time");
    }

    fn zero_delay_state(pool: Arc<FakePool>) -> AppState {
        let mut state = test_state_with_pool(pool);
        let mut config = (*state.config).clone();
        config.batch.item_delay_ms = 0;
        state.config = Arc::new(config);
        state
    }

    #[tokio::test]
    async fn test_start_import_runs_to_completion() {
        let pool = Arc::new(FakePool::new());
        let state = zero_delay_state(pool.clone());

        let started = start_import(
            State(state.clone()),
            Json(StartImportRequest {
                text: "tok-1\ntok-2\n".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(started.0.total, 2);
        let snap = wait_for_finish(&state, &started.0.id).await;
        assert_eq!(snap.succeeded, 2);
        assert_eq!(pool.credentials().len(), 2);
    }

    #[tokio::test]
    async fn test_start_import_rejects_empty_text() {
        let state = zero_delay_state(Arc::new(FakePool::new()));
        let result = start_import(
            State(state),
            Json(StartImportRequest {
                text: "\n# only comments\n".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_start_sweep_and_poll() {
        let pool = Arc::new(FakePool::new());
        pool.seed("tok-a", None);
        let state = zero_delay_state(pool);

        let started = start_verify_all(State(state.clone())).await.unwrap();
        let snap = wait_for_finish(&state, &started.0.id).await;
        assert_eq!(snap.total, 1);
        assert_eq!(snap.succeeded, 1);
    }

    #[tokio::test]
    async fn test_second_batch_rejected_while_running() {
        let pool = Arc::new(FakePool::new());
        // A long delay keeps the first batch running while we try the second.
        let mut state = test_state_with_pool(pool);
        let mut config = (*state.config).clone();
        config.batch.item_delay_ms = 60_000;
        state.config = Arc::new(config);

        let first = start_import(
            State(state.clone()),
            Json(StartImportRequest {
                text: "tok-1\ntok-2\n".to_string(),
            }),
        )
        .await
        .unwrap();

        let second = start_verify_all(State(state.clone())).await;
        assert!(matches!(second, Err(AppError::BadRequest(_))));

        // Cleanup so the spawned task stops quickly.
        cancel_batch(State(state), Path(first.0.id)).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_batch_unknown_is_404() {
        let state = zero_delay_state(Arc::new(FakePool::new()));
        let result = get_batch(State(state), Path("nope".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_marks_job() {
        let pool = Arc::new(FakePool::new());
        for i in 0..5 {
            pool.seed(&format!("tok-{i}"), None);
        }
        let mut state = test_state_with_pool(pool);
        let mut config = (*state.config).clone();
        config.batch.item_delay_ms = 50;
        state.config = Arc::new(config);

        let started = start_verify_all(State(state.clone())).await.unwrap();
        cancel_batch(State(state.clone()), Path(started.0.id.clone()))
            .await
            .unwrap();

        let snap = wait_for_finish(&state, &started.0.id).await;
        assert_eq!(snap.state, JobState::Cancelled);
        assert!(snap.processed < 5);
    }
}
