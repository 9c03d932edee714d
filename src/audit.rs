//! Background action log.
//!
//! Admin handlers and batch jobs report what they did over an unbounded mpsc
//! channel; a spawned task batch-writes the entries to the `action_log`
//! table so the activity page never blocks a request on a disk write.

use std::time::Duration;

use rusqlite::params;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::Database;

/// Maximum number of entries to buffer before flushing, regardless of timer.
const BATCH_SIZE: usize = 100;

/// How often to flush buffered entries even if the batch is not full.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// A single recorded admin action.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Action kind, e.g. "add", "delete", "verify", "import", "strategy".
    pub kind: String,
    /// What was acted on: a credential id, a batch id, or a mode name.
    pub subject: String,
    /// "success", "failed", "skipped", "cancelled".
    pub outcome: String,
    /// Free-form detail, e.g. the batch summary line or an error message.
    pub detail: String,
}

impl AuditEntry {
    pub fn new(kind: &str, subject: &str, outcome: &str, detail: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            subject: subject.to_string(),
            outcome: outcome.to_string(),
            detail: detail.into(),
        }
    }
}

/// Sender half used throughout the app. Sends never block; a dropped
/// receiver just means entries are discarded during shutdown.
pub type AuditSender = mpsc::UnboundedSender<AuditEntry>;

/// Record an entry, ignoring a closed channel.
pub fn record(tx: &AuditSender, entry: AuditEntry) {
    if tx.send(entry).is_err() {
        tracing::debug!("Audit channel closed, dropping entry");
    }
}

/// Spawn a background task that reads `AuditEntry` values from the channel
/// and batch-writes them to the `action_log` table.
///
/// The returned `JoinHandle` can be used to wait for graceful shutdown (the
/// task exits when the sender half is dropped and remaining entries are
/// flushed).
pub fn spawn_audit_logger(
    db: Database,
    mut rx: mpsc::UnboundedReceiver<AuditEntry>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buffer: Vec<AuditEntry> = Vec::with_capacity(BATCH_SIZE);
        let mut interval = tokio::time::interval(FLUSH_INTERVAL);
        // Don't pile up ticks while we're busy flushing.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                entry = rx.recv() => {
                    match entry {
                        Some(e) => {
                            buffer.push(e);
                            if buffer.len() >= BATCH_SIZE {
                                flush_batch(&db, &mut buffer);
                            }
                        }
                        None => {
                            // Channel closed -- flush remaining and exit.
                            if !buffer.is_empty() {
                                flush_batch(&db, &mut buffer);
                            }
                            tracing::info!("Audit logger shutting down");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    if !buffer.is_empty() {
                        flush_batch(&db, &mut buffer);
                    }
                }
            }
        }
    })
}

/// Write a batch of audit entries to the database in a single transaction.
fn flush_batch(db: &Database, buffer: &mut Vec<AuditEntry>) {
    let entries = std::mem::take(buffer);
    let count = entries.len();

    if let Err(e) = write_entries(db, &entries) {
        tracing::error!(count, error = %e, "Failed to flush audit batch");
        // Put entries back so we can retry on the next tick.
        buffer.extend(entries);
    } else {
        tracing::debug!(count, "Flushed audit batch");
    }
}

fn write_entries(db: &Database, entries: &[AuditEntry]) -> Result<(), rusqlite::Error> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        {
            let mut insert_stmt = tx.prepare_cached(
                "INSERT INTO action_log (id, kind, subject, outcome, detail) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for entry in entries {
                let id = Uuid::new_v4().to_string();
                insert_stmt.execute(params![
                    id,
                    entry.kind,
                    entry.subject,
                    entry.outcome,
                    entry.detail,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_rows(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM action_log", [], |row| row.get(0))
        })
        .unwrap()
    }

    #[test]
    fn test_write_entries_inserts_rows() {
        let db = Database::open_in_memory().unwrap();
        let entries = vec![
            AuditEntry::new("verify", "cred-1", "success", ""),
            AuditEntry::new("delete", "cred-2", "failed", "upstream 503"),
        ];
        write_entries(&db, &entries).unwrap();
        assert_eq!(count_rows(&db), 2);
    }

    #[test]
    fn test_flush_batch_clears_buffer() {
        let db = Database::open_in_memory().unwrap();
        let mut buffer = vec![AuditEntry::new("import", "batch-1", "success", "3 imported")];
        flush_batch(&db, &mut buffer);
        assert!(buffer.is_empty());
        assert_eq!(count_rows(&db), 1);
    }

    #[tokio::test]
    async fn test_logger_drains_on_channel_close() {
        let db = Database::open_in_memory().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_audit_logger(db.clone(), rx);

        record(&tx, AuditEntry::new("add", "cred-1", "success", ""));
        record(&tx, AuditEntry::new("add", "cred-2", "success", ""));
        drop(tx);

        handle.await.unwrap();
        assert_eq!(count_rows(&db), 2);
    }

    #[test]
    fn test_record_ignores_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        // Must not panic.
        record(&tx, AuditEntry::new("add", "cred-1", "success", ""));
    }
}
