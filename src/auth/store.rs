use rusqlite::params;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Operator;
use crate::auth::keys::{self, GeneratedKey};
use crate::db::Database;
use crate::error::AppError;

/// Stored operator key metadata (never includes the hash).
#[derive(Debug, Clone, Serialize)]
pub struct OperatorKeyInfo {
    pub id: String,
    pub key_prefix: String,
    pub label: String,
    pub created_at: String,
    pub last_used: Option<String>,
}

/// Result of creating a new operator key: metadata plus the one-time plaintext.
#[derive(Debug)]
pub struct CreatedOperatorKey {
    pub info: OperatorKeyInfo,
    pub plaintext: String,
}

// ---------------------------------------------------------------------------
// Operator key CRUD
// ---------------------------------------------------------------------------

/// Create a new operator key with the given label.
pub fn create_operator_key(db: &Database, label: &str) -> Result<CreatedOperatorKey, AppError> {
    let generated = keys::generate_operator_key()
        .map_err(|e| AppError::Internal(format!("Failed to generate operator key: {e}")))?;

    let GeneratedKey {
        plaintext,
        hash,
        prefix,
    } = generated;

    let key_id = Uuid::new_v4().to_string();

    let info = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO operator_keys (id, key_hash, key_prefix, label) VALUES (?1, ?2, ?3, ?4)",
            params![key_id, hash, prefix, label],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, key_prefix, label, created_at, last_used FROM operator_keys WHERE id = ?1",
        )?;
        stmt.query_row(params![key_id], |row| {
            Ok(OperatorKeyInfo {
                id: row.get(0)?,
                key_prefix: row.get(1)?,
                label: row.get(2)?,
                created_at: row.get(3)?,
                last_used: row.get(4)?,
            })
        })
    })?;

    tracing::info!(key_id = %info.id, prefix = %info.key_prefix, "Operator key created");

    Ok(CreatedOperatorKey { info, plaintext })
}

/// List all operator keys (metadata only, no hashes).
pub fn list_operator_keys(db: &Database) -> Result<Vec<OperatorKeyInfo>, AppError> {
    let keys = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, key_prefix, label, created_at, last_used \
             FROM operator_keys ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(OperatorKeyInfo {
                id: row.get(0)?,
                key_prefix: row.get(1)?,
                label: row.get(2)?,
                created_at: row.get(3)?,
                last_used: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
    })?;
    Ok(keys)
}

// ---------------------------------------------------------------------------
// Auth validation (used by middleware)
// ---------------------------------------------------------------------------

/// Validate a plaintext operator key against the database.
///
/// Iterates all stored key hashes and verifies with argon2. On success,
/// updates `last_used` and returns the associated [`Operator`].
pub fn validate_operator_key(db: &Database, plaintext: &str) -> Result<Operator, AppError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id, key_hash, label FROM operator_keys")?;
        let mapped = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        mapped.collect::<Result<Vec<_>, _>>()
    })?;

    for (key_id, key_hash, label) in &rows {
        let ok = keys::verify_key(plaintext, key_hash)
            .map_err(|e| AppError::Internal(format!("Key verification error: {e}")))?;

        if ok {
            // Update last_used timestamp (best-effort).
            let _ = db.with_conn(|conn| {
                conn.execute(
                    "UPDATE operator_keys SET last_used = datetime('now') WHERE id = ?1",
                    params![key_id],
                )
            });

            return Ok(Operator {
                key_id: key_id.clone(),
                label: label.clone(),
            });
        }
    }

    Err(AppError::Unauthorized("Invalid operator key".to_string()))
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// If no operator keys exist, create one and print the plaintext to stdout
/// so the operator can sign in. Returns `None` if keys already exist.
pub fn bootstrap_operator_key(
    db: &Database,
    label: &str,
) -> Result<Option<CreatedOperatorKey>, AppError> {
    let key_count: i64 = db.with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM operator_keys", [], |row| row.get(0))
    })?;

    if key_count > 0 {
        return Ok(None);
    }

    tracing::info!("No operator keys found -- bootstrapping");

    let key = create_operator_key(db, label)?;

    println!();
    println!("=========================================================");
    println!("  kiro-pool first-run bootstrap");
    println!("---------------------------------------------------------");
    println!("  Operator key : {}", key.plaintext);
    println!("---------------------------------------------------------");
    println!("  Save this key now -- it will not be shown again.");
    println!("=========================================================");
    println!();

    Ok(Some(key))
}
