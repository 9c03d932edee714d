//! Embedded Web UI for kiro-pool.
//!
//! Provides the credential pool dashboard, the batch import page, and the
//! activity log -- all rendered from embedded HTML templates via minijinja.
//! Pages are HTML shells; data loads via AJAX against the `/admin` API with
//! the operator key held in `sessionStorage`.

pub mod templates;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use minijinja::{Environment, context};

use crate::AppState;

// ---------------------------------------------------------------------------
// Template engine
// ---------------------------------------------------------------------------

/// Build a minijinja environment with all embedded templates registered.
fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template("layout", templates::LAYOUT)
        .expect("layout template");
    env.add_template("login", templates::LOGIN)
        .expect("login template");
    env.add_template("dashboard", templates::DASHBOARD)
        .expect("dashboard template");
    env.add_template("import", templates::IMPORT)
        .expect("import template");
    env.add_template("activity", templates::ACTIVITY)
        .expect("activity template");
    env
}

/// Render a template by name with the given minijinja context.
fn render(template_name: &str, ctx: minijinja::Value) -> Response {
    let env = template_env();
    match env.get_template(template_name) {
        Ok(tmpl) => match tmpl.render(ctx) {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!(template = template_name, error = %err, "Template render error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(format!(
                        "<h1>Template Error</h1><pre>{}</pre>",
                        html_escape(&err.to_string())
                    )),
                )
                    .into_response()
            }
        },
        Err(err) => {
            tracing::error!(template = template_name, error = %err, "Template not found");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Template Not Found</h1>".to_string()),
            )
                .into_response()
        }
    }
}

/// Minimal HTML entity escaping for error messages.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Public router builder
// ---------------------------------------------------------------------------

/// Build the web UI router with all page routes.
///
/// These routes do NOT go through the API auth middleware: pages are plain
/// HTML shells with no data in them. Everything sensitive is fetched via the
/// `/admin` AJAX endpoints, which validate the operator key.
pub fn build_web_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_redirect))
        .route("/ui/login", get(login_page))
        .route("/ui/dashboard", get(dashboard_page))
        .route("/ui/import", get(import_page))
        .route("/ui/activity", get(activity_page))
}

// ---------------------------------------------------------------------------
// Page handlers
// ---------------------------------------------------------------------------

/// Redirect `/` to the dashboard.
async fn index_redirect() -> Redirect {
    Redirect::temporary("/ui/dashboard")
}

/// Login page -- no authentication required.
async fn login_page() -> Response {
    render("login", context! {})
}

/// Dashboard page -- serves the HTML shell; data loaded via AJAX.
async fn dashboard_page() -> Response {
    render("dashboard", context! {})
}

/// Batch import page -- HTML shell, progress via AJAX polling.
async fn import_page() -> Response {
    render("import", context! {})
}

/// Activity log page -- HTML shell, data via AJAX.
async fn activity_page() -> Response {
    render("activity", context! {})
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
