//! Shared test fixtures: an in-memory pool core and an `AppState` builder.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::AppState;
use crate::batch::JobRegistry;
use crate::config::Config;
use crate::db::Database;
use crate::upstream::{
    Balance, CreateCredential, Credential, LoadBalanceMode, PoolApi, UpstreamError, VerifyOutcome,
    token_fingerprint,
};

struct FakeCred {
    cred: Credential,
    token: String,
}

/// In-memory stand-in for the pool core, with per-token failure injection
/// and a call log for asserting ordering.
pub struct FakePool {
    creds: Mutex<Vec<FakeCred>>,
    next_id: AtomicUsize,
    mode: Mutex<LoadBalanceMode>,
    calls: Mutex<Vec<String>>,
    list_fails: AtomicBool,
    fail_create: Mutex<HashSet<String>>,
    fail_verify: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
    fail_disable: Mutex<HashSet<String>>,
}

impl FakePool {
    pub fn new() -> Self {
        Self {
            creds: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            mode: Mutex::new(LoadBalanceMode::RoundRobin),
            calls: Mutex::new(Vec::new()),
            list_fails: AtomicBool::new(false),
            fail_create: Mutex::new(HashSet::new()),
            fail_verify: Mutex::new(HashSet::new()),
            fail_delete: Mutex::new(HashSet::new()),
            fail_disable: Mutex::new(HashSet::new()),
        }
    }

    /// Insert a credential directly, bypassing failure injection.
    /// Returns the assigned id.
    pub fn seed(&self, token: &str, email: Option<&str>) -> String {
        let id = format!("cred-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.creds.lock().unwrap().push(FakeCred {
            cred: Credential {
                id: id.clone(),
                email: email.map(String::from),
                token_hash: token_fingerprint(token),
                disabled: false,
                failure_count: 0,
                created_at: "2025-01-01 00:00:00".to_string(),
            },
            token: token.to_string(),
        });
        id
    }

    pub fn set_disabled_sync(&self, id: &str, disabled: bool) {
        let mut creds = self.creds.lock().unwrap();
        if let Some(entry) = creds.iter_mut().find(|c| c.cred.id == id) {
            entry.cred.disabled = disabled;
        }
    }

    pub fn fail_list(&self) {
        self.list_fails.store(true, Ordering::Relaxed);
    }

    pub fn fail_create_token(&self, token: &str) {
        self.fail_create.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_verify_token(&self, token: &str) {
        self.fail_verify.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_delete_token(&self, token: &str) {
        self.fail_delete.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_disable_token(&self, token: &str) {
        self.fail_disable.lock().unwrap().insert(token.to_string());
    }

    pub fn credentials(&self) -> Vec<Credential> {
        self.creds
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.cred.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn token_of(&self, id: &str) -> Option<String> {
        self.creds
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.cred.id == id)
            .map(|c| c.token.clone())
    }

    fn server_error(what: &str) -> UpstreamError {
        UpstreamError::Api {
            status: 500,
            message: format!("injected {what} failure"),
        }
    }
}

#[async_trait]
impl PoolApi for FakePool {
    async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
        self.log("list".to_string());
        if self.list_fails.load(Ordering::Relaxed) {
            return Err(Self::server_error("list"));
        }
        Ok(self.credentials())
    }

    async fn create_credential(
        &self,
        req: &CreateCredential,
    ) -> Result<Credential, UpstreamError> {
        self.log(format!("create:{}", req.email.as_deref().unwrap_or("-")));
        if self.fail_create.lock().unwrap().contains(&req.refresh_token) {
            return Err(Self::server_error("create"));
        }
        let id = self.seed(&req.refresh_token, req.email.as_deref());
        let creds = self.creds.lock().unwrap();
        Ok(creds
            .iter()
            .find(|c| c.cred.id == id)
            .map(|c| c.cred.clone())
            .expect("just seeded"))
    }

    async fn delete_credential(&self, id: &str) -> Result<(), UpstreamError> {
        self.log(format!("delete:{id}"));
        let token = self
            .token_of(id)
            .ok_or_else(|| UpstreamError::NotFound(id.to_string()))?;
        if self.fail_delete.lock().unwrap().contains(&token) {
            return Err(Self::server_error("delete"));
        }
        self.creds.lock().unwrap().retain(|c| c.cred.id != id);
        Ok(())
    }

    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<(), UpstreamError> {
        let action = if disabled { "disable" } else { "enable" };
        self.log(format!("{action}:{id}"));
        let token = self
            .token_of(id)
            .ok_or_else(|| UpstreamError::NotFound(id.to_string()))?;
        if self.fail_disable.lock().unwrap().contains(&token) {
            return Err(Self::server_error("disable"));
        }
        self.set_disabled_sync(id, disabled);
        Ok(())
    }

    async fn verify_credential(&self, id: &str) -> Result<VerifyOutcome, UpstreamError> {
        self.log(format!("verify:{id}"));
        let token = self
            .token_of(id)
            .ok_or_else(|| UpstreamError::NotFound(id.to_string()))?;
        if self.fail_verify.lock().unwrap().contains(&token) {
            return Ok(VerifyOutcome {
                ok: false,
                message: Some("token rejected by Kiro".to_string()),
            });
        }
        Ok(VerifyOutcome {
            ok: true,
            message: None,
        })
    }

    async fn fetch_balance(&self, id: &str) -> Result<Balance, UpstreamError> {
        self.log(format!("balance:{id}"));
        if self.token_of(id).is_none() {
            return Err(UpstreamError::NotFound(id.to_string()));
        }
        Ok(Balance {
            used: 12.5,
            limit: 50.0,
        })
    }

    async fn get_balance_mode(&self) -> Result<LoadBalanceMode, UpstreamError> {
        Ok(*self.mode.lock().unwrap())
    }

    async fn set_balance_mode(&self, mode: LoadBalanceMode) -> Result<(), UpstreamError> {
        self.log(format!("mode:{mode}"));
        *self.mode.lock().unwrap() = mode;
        Ok(())
    }
}

/// Build a minimal [`AppState`] with an in-memory database and a fresh
/// [`FakePool`].
pub fn test_state() -> AppState {
    test_state_with_pool(Arc::new(FakePool::new()))
}

pub fn test_state_with_pool(pool: Arc<FakePool>) -> AppState {
    let db = Database::open_in_memory().unwrap();
    let (audit_tx, _audit_rx) = tokio::sync::mpsc::unbounded_channel();

    AppState {
        config: Arc::new(Config::default()),
        config_path: PathBuf::from("kiro-pool.toml"),
        db,
        pool,
        jobs: Arc::new(JobRegistry::new()),
        audit_tx,
    }
}
