use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::audit::{AuditEntry, record};
use crate::error::AppError;
use crate::upstream::{Credential, CreateCredential, VerifyOutcome, token_fingerprint};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddCredentialRequest {
    pub refresh_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub used: f64,
    pub limit: f64,
    pub remaining: f64,
    pub percent_used: f64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct DisabledResponse {
    pub id: String,
    pub disabled: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /admin/credentials
pub async fn list_credentials(
    State(state): State<AppState>,
) -> Result<Json<Vec<Credential>>, AppError> {
    let credentials = state.pool.list_credentials().await?;
    Ok(Json(credentials))
}

/// POST /admin/credentials
///
/// The token is fingerprinted and checked against the existing pool before
/// anything is created; a duplicate is a 400, not a second credential.
pub async fn add_credential(
    State(state): State<AppState>,
    Json(body): Json<AddCredentialRequest>,
) -> Result<Json<Credential>, AppError> {
    let token = body.refresh_token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("refresh_token must not be empty".to_string()));
    }

    let fingerprint = token_fingerprint(token);
    let existing = state.pool.list_credentials().await?;
    if let Some(dup) = existing.iter().find(|c| c.token_hash == fingerprint) {
        return Err(AppError::BadRequest(format!(
            "Duplicate token: credential '{}' already holds this token",
            dup.id
        )));
    }

    let created = state
        .pool
        .create_credential(&CreateCredential {
            refresh_token: token.to_string(),
            email: body.email.clone(),
        })
        .await?;

    tracing::info!(credential = %created.id, "Credential added");
    record(
        &state.audit_tx,
        AuditEntry::new("add", &created.id, "success", ""),
    );
    Ok(Json(created))
}

/// DELETE /admin/credentials/{id}
pub async fn delete_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    state.pool.delete_credential(&id).await?;

    tracing::info!(credential = %id, "Credential deleted");
    record(&state.audit_tx, AuditEntry::new("delete", &id, "success", ""));
    Ok(Json(DeletedResponse { deleted: true }))
}

/// POST /admin/credentials/{id}/disable
pub async fn disable_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DisabledResponse>, AppError> {
    state.pool.set_disabled(&id, true).await?;

    record(&state.audit_tx, AuditEntry::new("disable", &id, "success", ""));
    Ok(Json(DisabledResponse { id, disabled: true }))
}

/// POST /admin/credentials/{id}/enable
pub async fn enable_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DisabledResponse>, AppError> {
    state.pool.set_disabled(&id, false).await?;

    record(&state.audit_tx, AuditEntry::new("enable", &id, "success", ""));
    Ok(Json(DisabledResponse {
        id,
        disabled: false,
    }))
}

/// POST /admin/credentials/{id}/verify
pub async fn verify_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VerifyOutcome>, AppError> {
    let outcome = state.pool.verify_credential(&id).await?;

    let status = if outcome.ok { "success" } else { "failed" };
    record(
        &state.audit_tx,
        AuditEntry::new(
            "verify",
            &id,
            status,
            outcome.message.clone().unwrap_or_default(),
        ),
    );
    Ok(Json(outcome))
}

/// GET /admin/credentials/{id}/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state.pool.fetch_balance(&id).await?;
    Ok(Json(BalanceResponse {
        used: balance.used,
        limit: balance.limit,
        remaining: balance.remaining(),
        percent_used: balance.percent_used(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_support::{FakePool, test_state_with_pool};

    #[test]
    fn test_add_credential_request_deserialization() {
        let json = r#"{"refresh_token": "tok-1", "email": "a@b.c"}"#;
        let req: AddCredentialRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.refresh_token, "tok-1");
        assert_eq!(req.email.as_deref(), Some("a@b.c"));

        let json = r#"{"refresh_token": "tok-1"}"#;
        let req: AddCredentialRequest = serde_json::from_str(json).unwrap();
        assert!(req.email.is_none());
    }

    #[test]
    fn test_deleted_response_serialization() {
        let json = serde_json::to_value(DeletedResponse { deleted: true }).unwrap();
        assert_eq!(json["deleted"], true);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_fingerprint() {
        let pool = Arc::new(FakePool::new());
        pool.seed("tok-dup", Some("old@example.com"));
        let state = test_state_with_pool(pool.clone());

        let result = add_credential(
            State(state),
            Json(AddCredentialRequest {
                refresh_token: "tok-dup".to_string(),
                email: Some("new@example.com".to_string()),
            }),
        )
        .await;

        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Duplicate token")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
        // Nothing was created.
        assert_eq!(pool.credentials().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_empty_token() {
        let state = test_state_with_pool(Arc::new(FakePool::new()));
        let result = add_credential(
            State(state),
            Json(AddCredentialRequest {
                refresh_token: "   ".to_string(),
                email: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_add_and_delete_round_trip() {
        let pool = Arc::new(FakePool::new());
        let state = test_state_with_pool(pool.clone());

        let created = add_credential(
            State(state.clone()),
            Json(AddCredentialRequest {
                refresh_token: "tok-new".to_string(),
                email: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(pool.credentials().len(), 1);

        let deleted = delete_credential(State(state), Path(created.0.id.clone()))
            .await
            .unwrap();
        assert!(deleted.0.deleted);
        assert!(pool.credentials().is_empty());
    }

    #[tokio::test]
    async fn test_disable_enable_toggle() {
        let pool = Arc::new(FakePool::new());
        let id = pool.seed("tok-1", None);
        let state = test_state_with_pool(pool.clone());

        let resp = disable_credential(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert!(resp.0.disabled);
        assert!(pool.credentials()[0].disabled);

        let resp = enable_credential(State(state), Path(id)).await.unwrap();
        assert!(!resp.0.disabled);
        assert!(!pool.credentials()[0].disabled);
    }

    #[tokio::test]
    async fn test_delete_unknown_credential_is_404() {
        let state = test_state_with_pool(Arc::new(FakePool::new()));
        let result = delete_credential(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_balance_includes_derived_fields() {
        let pool = Arc::new(FakePool::new());
        let id = pool.seed("tok-1", None);
        let state = test_state_with_pool(pool);

        let resp = get_balance(State(state), Path(id)).await.unwrap();
        assert_eq!(resp.0.used, 12.5);
        assert_eq!(resp.0.limit, 50.0);
        assert_eq!(resp.0.remaining, 37.5);
        assert_eq!(resp.0.percent_used, 25.0);
    }
}
