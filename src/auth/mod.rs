pub mod keys;
pub mod middleware;
pub mod store;

use serde::Serialize;

/// Authenticated operator identity attached to request extensions by the
/// auth middleware.
#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub key_id: String,
    pub label: String,
}
