pub mod activity;
pub mod batches;
pub mod credentials;
pub mod health;
pub mod strategy;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};

use crate::AppState;
use crate::auth::middleware::require_operator;

/// Build the full API router with all endpoint groups.
///
/// Route layout:
/// ```text
/// /health                                 GET    (no auth)
/// /admin/credentials                      GET    (operator)
/// /admin/credentials                      POST   (operator)
/// /admin/credentials/:id                  DELETE (operator)
/// /admin/credentials/:id/disable          POST   (operator)
/// /admin/credentials/:id/enable           POST   (operator)
/// /admin/credentials/:id/verify           POST   (operator)
/// /admin/credentials/:id/balance          GET    (operator)
/// /admin/strategy                         GET    (operator)
/// /admin/strategy                         PUT    (operator)
/// /admin/batches/import                   POST   (operator)
/// /admin/batches/verify                   POST   (operator)
/// /admin/batches/delete-disabled          POST   (operator)
/// /admin/batches/:id                      GET    (operator)
/// /admin/batches/:id/cancel               POST   (operator)
/// /admin/activity                         GET    (operator)
/// ```
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/credentials", get(credentials::list_credentials))
        .route("/credentials", post(credentials::add_credential))
        .route("/credentials/{id}", delete(credentials::delete_credential))
        .route(
            "/credentials/{id}/disable",
            post(credentials::disable_credential),
        )
        .route(
            "/credentials/{id}/enable",
            post(credentials::enable_credential),
        )
        .route(
            "/credentials/{id}/verify",
            post(credentials::verify_credential),
        )
        .route("/credentials/{id}/balance", get(credentials::get_balance))
        .route("/strategy", get(strategy::get_strategy))
        .route("/strategy", put(strategy::set_strategy))
        .route("/batches/import", post(batches::start_import))
        .route("/batches/verify", post(batches::start_verify_all))
        .route(
            "/batches/delete-disabled",
            post(batches::start_delete_disabled),
        )
        .route("/batches/{id}", get(batches::get_batch))
        .route("/batches/{id}/cancel", post(batches::cancel_batch))
        .route("/activity", get(activity::query_activity))
        .layer(middleware::from_fn_with_state(state, require_operator));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/admin", admin_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[test]
    fn test_build_api_router_creates_router() {
        // Smoke test: ensure the router builds without panicking.
        let state = test_state();
        let _router: Router<AppState> = build_api_router(state);
    }
}
