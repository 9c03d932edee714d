//! Pool-wide sweeps: verify every credential, delete the disabled ones.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditSender, record};
use crate::upstream::{Credential, PoolApi};

use super::{ItemOutcome, JobHandle, pace};

fn display_label(cred: &Credential) -> String {
    match &cred.email {
        Some(email) => email.clone(),
        None => cred.id.clone(),
    }
}

/// Fetch the listing that a sweep iterates over, failing the job if the
/// pool core is unreachable.
async fn sweep_listing(
    pool: &dyn PoolApi,
    job: &JobHandle,
    audit: &AuditSender,
    kind: &str,
) -> Option<Vec<Credential>> {
    match pool.list_credentials().await {
        Ok(credentials) => {
            job.set_total(credentials.len());
            Some(credentials)
        }
        Err(e) => {
            warn!(error = %e, "Sweep aborted: could not list credentials");
            job.finish(format!("{kind} failed to start: {e}"));
            record(audit, AuditEntry::new(kind, &job.id, "failed", e.to_string()));
            None
        }
    }
}

/// Verify every credential in the pool, in listing order.
///
/// Disabled credentials are verified too: the operator may want to know
/// whether a previously failing account has recovered before re-enabling it.
pub async fn run_verify_all(
    pool: Arc<dyn PoolApi>,
    job: Arc<JobHandle>,
    delay: Duration,
    audit: AuditSender,
) {
    let Some(credentials) = sweep_listing(&*pool, &job, &audit, "verify_all").await else {
        return;
    };

    let total = credentials.len();
    for (index, cred) in credentials.iter().enumerate() {
        if job.is_cancelled() {
            info!(job = %job.id, processed = index, "Verify sweep cancelled");
            break;
        }

        let label = display_label(cred);
        match pool.verify_credential(&cred.id).await {
            Ok(outcome) if outcome.ok => {
                job.record_item(&label, ItemOutcome::Succeeded, "");
            }
            Ok(outcome) => {
                let reason = outcome
                    .message
                    .unwrap_or_else(|| "verification rejected".to_string());
                job.record_item(&label, ItemOutcome::Failed, reason);
            }
            Err(e) => {
                job.record_item(&label, ItemOutcome::Failed, e.to_string());
            }
        }

        pace(delay, index, total).await;
    }

    let snap = job.snapshot();
    let summary = format!(
        "verified {} of {}, {} failed",
        snap.succeeded, snap.total, snap.failed
    );
    info!(job = %job.id, %summary, "Verify sweep finished");

    let outcome = if job.is_cancelled() {
        "cancelled"
    } else {
        "success"
    };
    job.finish(summary.clone());
    record(&audit, AuditEntry::new("verify_all", &job.id, outcome, summary));
}

/// Delete every disabled credential. Enabled credentials are skipped, never
/// deleted -- disabling first is the explicit confirmation step.
pub async fn run_delete_disabled(
    pool: Arc<dyn PoolApi>,
    job: Arc<JobHandle>,
    delay: Duration,
    audit: AuditSender,
) {
    let Some(credentials) = sweep_listing(&*pool, &job, &audit, "delete_disabled").await else {
        return;
    };

    let total = credentials.len();
    for (index, cred) in credentials.iter().enumerate() {
        if job.is_cancelled() {
            info!(job = %job.id, processed = index, "Delete sweep cancelled");
            break;
        }

        let label = display_label(cred);

        if !cred.disabled {
            job.record_item(&label, ItemOutcome::Skipped, "not disabled");
            pace(delay, index, total).await;
            continue;
        }

        match pool.delete_credential(&cred.id).await {
            Ok(()) => job.record_item(&label, ItemOutcome::Succeeded, ""),
            Err(e) => job.record_item(&label, ItemOutcome::Failed, e.to_string()),
        }

        pace(delay, index, total).await;
    }

    let snap = job.snapshot();
    let summary = format!(
        "deleted {} disabled credentials, {} skipped, {} failed",
        snap.succeeded, snap.skipped, snap.failed
    );
    info!(job = %job.id, %summary, "Delete sweep finished");

    let outcome = if job.is_cancelled() {
        "cancelled"
    } else {
        "success"
    };
    job.finish(summary.clone());
    record(
        &audit,
        AuditEntry::new("delete_disabled", &job.id, outcome, summary),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{JobKind, JobRegistry, JobState};
    use crate::test_support::FakePool;

    fn audit_sink() -> AuditSender {
        tokio::sync::mpsc::unbounded_channel().0
    }

    fn job(kind: JobKind) -> Arc<JobHandle> {
        JobRegistry::new().start(kind, 0).unwrap()
    }

    #[tokio::test]
    async fn test_verify_all_counts_failures() {
        let pool = Arc::new(FakePool::new());
        pool.seed("tok-good", Some("good@example.com"));
        pool.seed("tok-bad", Some("bad@example.com"));
        pool.fail_verify_token("tok-bad");

        let job = job(JobKind::VerifyAll);
        run_verify_all(pool.clone(), job.clone(), Duration::ZERO, audit_sink()).await;

        let snap = job.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.state, JobState::Completed);
        assert!(snap.summary.unwrap().contains("verified 1 of 2"));
    }

    #[tokio::test]
    async fn test_verify_all_includes_disabled() {
        let pool = Arc::new(FakePool::new());
        let id = pool.seed("tok-a", None);
        pool.set_disabled_sync(&id, true);

        let job = job(JobKind::VerifyAll);
        run_verify_all(pool.clone(), job.clone(), Duration::ZERO, audit_sink()).await;

        assert_eq!(job.snapshot().processed, 1);
    }

    #[tokio::test]
    async fn test_delete_disabled_skips_enabled() {
        let pool = Arc::new(FakePool::new());
        let id_a = pool.seed("tok-a", Some("a@example.com"));
        pool.seed("tok-b", Some("b@example.com"));
        pool.set_disabled_sync(&id_a, true);

        let job = job(JobKind::DeleteDisabled);
        run_delete_disabled(pool.clone(), job.clone(), Duration::ZERO, audit_sink()).await;

        let snap = job.snapshot();
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.skipped, 1);

        // Only the enabled credential survives.
        let remaining = pool.credentials();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].email.as_deref(), Some("b@example.com"));
    }

    #[tokio::test]
    async fn test_delete_disabled_counts_upstream_failures() {
        let pool = Arc::new(FakePool::new());
        let id = pool.seed("tok-a", None);
        pool.set_disabled_sync(&id, true);
        pool.fail_delete_token("tok-a");

        let job = job(JobKind::DeleteDisabled);
        run_delete_disabled(pool.clone(), job.clone(), Duration::ZERO, audit_sink()).await;

        let snap = job.snapshot();
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.succeeded, 0);
        // The credential is still there.
        assert_eq!(pool.credentials().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_cancellation_partial_summary() {
        let pool = Arc::new(FakePool::new());
        pool.seed("tok-a", None);
        pool.seed("tok-b", None);

        let job = job(JobKind::VerifyAll);
        job.cancel();
        run_verify_all(pool.clone(), job.clone(), Duration::ZERO, audit_sink()).await;

        let snap = job.snapshot();
        assert_eq!(snap.state, JobState::Cancelled);
        assert_eq!(snap.processed, 0);
        assert!(snap.summary.is_some());
    }
}
