use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditSender, record};
use crate::upstream::{CreateCredential, PoolApi, token_fingerprint};

use super::{ItemOutcome, JobHandle, JobState, pace};

/// One pasted import line: a refresh token with an optional email label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub refresh_token: String,
    pub email: Option<String>,
}

impl ImportItem {
    /// Display label for progress rows: the email when present, otherwise a
    /// fingerprint prefix (never the token itself).
    pub fn label(&self) -> String {
        match &self.email {
            Some(email) => email.clone(),
            None => {
                let fp = token_fingerprint(&self.refresh_token);
                format!("token {}", &fp[..12])
            }
        }
    }
}

/// Parse pasted import text: one item per line, `token` or `token,email`.
/// Blank lines and `#` comments are ignored.
pub fn parse_import_lines(text: &str) -> Vec<ImportItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(',') {
            Some((token, email)) => {
                let email = email.trim();
                ImportItem {
                    refresh_token: token.trim().to_string(),
                    email: (!email.is_empty()).then(|| email.to_string()),
                }
            }
            None => ImportItem {
                refresh_token: line.to_string(),
                email: None,
            },
        })
        .filter(|item| !item.refresh_token.is_empty())
        .collect()
}

/// Run a batch import to completion.
///
/// Items are processed strictly in order. Each item is fingerprinted and
/// checked against the existing pool and the fingerprints already seen in
/// this batch BEFORE anything is created. A created credential that fails
/// verification is rolled back best-effort (disable, then delete); rollback
/// success and failure are reported as distinct outcomes.
pub async fn run_import(
    pool: Arc<dyn PoolApi>,
    job: Arc<JobHandle>,
    items: Vec<ImportItem>,
    delay: Duration,
    audit: AuditSender,
) {
    // One listing up front gives us the duplicate baseline; fingerprints of
    // this batch's own creations are folded in as we go.
    let mut seen: HashSet<String> = match pool.list_credentials().await {
        Ok(existing) => existing.into_iter().map(|c| c.token_hash).collect(),
        Err(e) => {
            warn!(error = %e, "Import aborted: could not list existing credentials");
            job.finish(format!("Import failed to start: {e}"));
            record(
                &audit,
                AuditEntry::new("import", &job.id, "failed", e.to_string()),
            );
            return;
        }
    };

    let total = items.len();

    for (index, item) in items.iter().enumerate() {
        if job.is_cancelled() {
            info!(job = %job.id, processed = index, "Import cancelled");
            break;
        }

        let label = item.label();
        let fingerprint = token_fingerprint(&item.refresh_token);

        // Duplicates are flagged before creation, never sent upstream.
        if !seen.insert(fingerprint) {
            job.record_item(&label, ItemOutcome::Skipped, "duplicate token fingerprint");
            pace(delay, index, total).await;
            continue;
        }

        let request = CreateCredential {
            refresh_token: item.refresh_token.trim().to_string(),
            email: item.email.clone(),
        };

        let created = match pool.create_credential(&request).await {
            Ok(cred) => cred,
            Err(e) => {
                job.record_item(&label, ItemOutcome::Failed, format!("create failed: {e}"));
                pace(delay, index, total).await;
                continue;
            }
        };

        match pool.verify_credential(&created.id).await {
            Ok(outcome) if outcome.ok => {
                job.record_item(&label, ItemOutcome::Succeeded, "");
            }
            Ok(outcome) => {
                let reason = outcome
                    .message
                    .unwrap_or_else(|| "verification rejected".to_string());
                rollback(&*pool, &job, &label, &created.id, &reason).await;
            }
            Err(e) => {
                rollback(&*pool, &job, &label, &created.id, &e.to_string()).await;
            }
        }

        pace(delay, index, total).await;
    }

    let summary = import_summary(&job);
    info!(job = %job.id, %summary, "Import finished");

    let outcome = if job.is_cancelled() {
        "cancelled"
    } else {
        "success"
    };
    job.finish(summary.clone());
    record(&audit, AuditEntry::new("import", &job.id, outcome, summary));
}

/// Best-effort removal of a credential that failed verification: disable it
/// first so the balancer stops handing it out, then delete it.
async fn rollback(
    pool: &dyn PoolApi,
    job: &JobHandle,
    label: &str,
    id: &str,
    reason: &str,
) {
    if let Err(e) = pool.set_disabled(id, true).await {
        warn!(credential = %id, error = %e, "Rollback disable failed");
        job.record_item(
            label,
            ItemOutcome::RollbackFailed,
            format!("{reason}; rollback failed at disable: {e}"),
        );
        return;
    }

    if let Err(e) = pool.delete_credential(id).await {
        warn!(credential = %id, error = %e, "Rollback delete failed");
        job.record_item(
            label,
            ItemOutcome::RollbackFailed,
            format!("{reason}; rollback failed at delete: {e}"),
        );
        return;
    }

    job.record_item(
        label,
        ItemOutcome::RolledBack,
        format!("{reason}; credential removed"),
    );
}

/// Human-readable one-line summary for toasts and the audit log.
fn import_summary(job: &JobHandle) -> String {
    let snap = job.snapshot();
    let mut parts = vec![format!("imported {} of {}", snap.succeeded, snap.total)];
    if snap.skipped > 0 {
        parts.push(format!("{} duplicates skipped", snap.skipped));
    }
    let plain_failures = snap.failed - snap.rolled_back - snap.rollback_failed;
    if plain_failures > 0 {
        parts.push(format!("{plain_failures} failed"));
    }
    if snap.rolled_back > 0 {
        parts.push(format!("{} rolled back", snap.rolled_back));
    }
    if snap.rollback_failed > 0 {
        parts.push(format!("{} rollback failures", snap.rollback_failed));
    }
    if job.state() == JobState::Running && job.is_cancelled() {
        parts.push("cancelled".to_string());
    }
    parts.join(", ")
}
