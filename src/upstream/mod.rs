//! Typed client for the remote pool-core API.
//!
//! The pool core owns the credential records, their Kiro token material, and
//! the load-balancing configuration. This module defines the error type, the
//! `PoolApi` trait that orchestration code programs against, and the concrete
//! `PoolClient` implementation over HTTP.

pub mod client;
pub mod models;

use async_trait::async_trait;

pub use self::client::PoolClient;
pub use self::models::{
    Balance, CreateCredential, Credential, LoadBalanceMode, VerifyOutcome, token_fingerprint,
};

// ---------------------------------------------------------------------------
// UpstreamError
// ---------------------------------------------------------------------------

/// Errors returned by pool-core API calls.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pool core rejected the service token")]
    Unauthorized,

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

// ---------------------------------------------------------------------------
// PoolApi trait
// ---------------------------------------------------------------------------

/// Operations the dashboard performs against the pool core.
///
/// Batch flows and handlers depend on `Arc<dyn PoolApi>` so tests can swap in
/// an in-memory fake instead of a live HTTP endpoint.
#[async_trait]
pub trait PoolApi: Send + Sync {
    /// Fetch the full credential listing.
    async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError>;

    /// Create a credential from a refresh token. Returns the stored record.
    async fn create_credential(
        &self,
        req: &CreateCredential,
    ) -> Result<Credential, UpstreamError>;

    /// Permanently delete a credential.
    async fn delete_credential(&self, id: &str) -> Result<(), UpstreamError>;

    /// Toggle the disabled flag.
    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<(), UpstreamError>;

    /// Ask the core to verify the credential against Kiro.
    async fn verify_credential(&self, id: &str) -> Result<VerifyOutcome, UpstreamError>;

    /// Fetch the usage/limit pair for a credential.
    async fn fetch_balance(&self, id: &str) -> Result<Balance, UpstreamError>;

    /// Current load-balancing mode.
    async fn get_balance_mode(&self) -> Result<LoadBalanceMode, UpstreamError>;

    /// Switch the load-balancing mode.
    async fn set_balance_mode(&self, mode: LoadBalanceMode) -> Result<(), UpstreamError>;
}
