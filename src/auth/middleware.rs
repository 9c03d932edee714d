use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::auth::Operator;
use crate::auth::store;
use crate::error::AppError;

/// Axum middleware that extracts a Bearer token from the Authorization header,
/// validates it against the stored operator keys, and injects an [`Operator`]
/// into request extensions.
///
/// When `auth.enabled = false` a synthetic anonymous operator is injected
/// instead, so development setups can skip the key dance.
pub async fn require_operator(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.auth.enabled {
        let anon = Operator {
            key_id: "anonymous".to_string(),
            label: "anonymous".to_string(),
        };
        request.extensions_mut().insert(anon);
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(&request)?;
    let operator = store::validate_operator_key(&state.db, &token)?;

    tracing::debug!(
        key_id = %operator.key_id,
        label = %operator.label,
        "Authenticated request"
    );

    request.extensions_mut().insert(operator);
    Ok(next.run(request).await)
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer_token(request: &Request) -> Result<String, AppError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use Bearer scheme".to_string())
        })?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty Bearer token".to_string()));
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use axum::middleware;
    use axum::routing::get;
    use tower::ServiceExt;

    use crate::auth::store::create_operator_key;
    use crate::test_support::test_state;

    async fn whoami(
        axum::Extension(operator): axum::Extension<Operator>,
    ) -> axum::Json<serde_json::Value> {
        axum::Json(serde_json::json!({ "label": operator.label }))
    }

    fn protected_app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                require_operator,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let state = test_state();
        let app = protected_app(state);

        let resp = app
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_scheme_rejected() {
        let state = test_state();
        let app = protected_app(state);

        let resp = app
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(header::AUTHORIZATION, "Basic abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_key_accepted() {
        let state = test_state();
        let created = create_operator_key(&state.db, "tester").unwrap();
        let app = protected_app(state);

        let resp = app
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", created.plaintext),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let state = test_state();
        create_operator_key(&state.db, "tester").unwrap();
        let app = protected_app(state);

        let resp = app
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(header::AUTHORIZATION, "Bearer sk-pool-nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_disabled_injects_anonymous() {
        let state = test_state_with(|config| config.auth.enabled = false);
        let app = protected_app(state);

        let resp = app
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    fn test_state_with(f: impl FnOnce(&mut crate::config::Config)) -> AppState {
        let mut state = test_state();
        let mut config = (*state.config).clone();
        f(&mut config);
        state.config = std::sync::Arc::new(config);
        state
    }
}
