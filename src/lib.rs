pub mod api;
pub mod audit;
pub mod auth;
pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod upstream;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::PathBuf;
use std::sync::Arc;

use crate::audit::AuditSender;
use crate::batch::JobRegistry;
use crate::config::Config;
use crate::db::Database;
use crate::upstream::PoolApi;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub config_path: PathBuf,
    pub db: Database,
    pub pool: Arc<dyn PoolApi>,
    pub jobs: Arc<JobRegistry>,
    pub audit_tx: AuditSender,
}
