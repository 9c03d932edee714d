use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// "ok" when the pool core answered, "unreachable" otherwise.
    pub upstream: &'static str,
}

/// GET /health -- no authentication required.
///
/// Pings the pool core with the cheapest call it has (the balancing-mode
/// read) so the dashboard can show upstream reachability.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream = match state.pool.get_balance_mode().await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Upstream health probe failed");
            "unreachable"
        }
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream,
    })
}
