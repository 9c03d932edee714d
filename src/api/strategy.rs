use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::audit::{AuditEntry, record};
use crate::error::AppError;
use crate::upstream::LoadBalanceMode;

#[derive(Debug, Serialize, Deserialize)]
pub struct StrategyBody {
    pub mode: LoadBalanceMode,
}

/// GET /admin/strategy
pub async fn get_strategy(
    State(state): State<AppState>,
) -> Result<Json<StrategyBody>, AppError> {
    let mode = state.pool.get_balance_mode().await?;
    Ok(Json(StrategyBody { mode }))
}

/// PUT /admin/strategy
pub async fn set_strategy(
    State(state): State<AppState>,
    Json(body): Json<StrategyBody>,
) -> Result<Json<StrategyBody>, AppError> {
    state.pool.set_balance_mode(body.mode).await?;

    tracing::info!(mode = %body.mode, "Load-balancing strategy changed");
    record(
        &state.audit_tx,
        AuditEntry::new("strategy", &body.mode.to_string(), "success", ""),
    );

    // Read back so the response reflects what the core actually applied.
    let mode = state.pool.get_balance_mode().await?;
    Ok(Json(StrategyBody { mode }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_support::{FakePool, test_state_with_pool};

    #[test]
    fn test_strategy_body_round_trip() {
        let body: StrategyBody = serde_json::from_str(r#"{"mode": "least_used"}"#).unwrap();
        assert_eq!(body.mode, LoadBalanceMode::LeastUsed);

        let json = serde_json::to_value(StrategyBody {
            mode: LoadBalanceMode::RoundRobin,
        })
        .unwrap();
        assert_eq!(json["mode"], "round_robin");
    }

    #[tokio::test]
    async fn test_toggle_strategy() {
        let pool = Arc::new(FakePool::new());
        let state = test_state_with_pool(pool);

        let current = get_strategy(State(state.clone())).await.unwrap();
        assert_eq!(current.0.mode, LoadBalanceMode::RoundRobin);

        let updated = set_strategy(
            State(state.clone()),
            Json(StrategyBody {
                mode: LoadBalanceMode::LeastUsed,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.mode, LoadBalanceMode::LeastUsed);

        let current = get_strategy(State(state)).await.unwrap();
        assert_eq!(current.0.mode, LoadBalanceMode::LeastUsed);
    }
}
