//! kiro-pool -- operator dashboard for a pool of Kiro credentials.
//!
//! This is the application entry point. It wires together all modules:
//!   - Configuration loading
//!   - Database initialization
//!   - Operator key bootstrapping
//!   - Pool-core HTTP client
//!   - Audit logger
//!   - Combined HTTP server (admin API + Web UI)
//!   - Graceful shutdown on SIGTERM / SIGINT

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use kiro_pool::AppState;
use kiro_pool::api;
use kiro_pool::audit::spawn_audit_logger;
use kiro_pool::auth::store::bootstrap_operator_key;
use kiro_pool::batch::JobRegistry;
use kiro_pool::config::Config;
use kiro_pool::db::Database;
use kiro_pool::upstream::PoolClient;
use kiro_pool::web;

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

struct CliArgs {
    config_path: PathBuf,
}

fn parse_args() -> CliArgs {
    let mut args = std::env::args().skip(1);
    let mut config_path = PathBuf::from("kiro-pool.toml");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                if let Some(path) = args.next() {
                    config_path = PathBuf::from(path);
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("kiro-pool {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Run with --help for usage information.");
                std::process::exit(1);
            }
        }
    }

    CliArgs { config_path }
}

fn print_usage() {
    println!(
        "\
kiro-pool {version} -- Kiro credential pool dashboard

USAGE:
    kiro-pool [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file [default: kiro-pool.toml]
    -h, --help             Print this help message
    -V, --version          Print version information

ENVIRONMENT:
    RUST_LOG               Override log level (e.g. RUST_LOG=debug)
    KIRO_POOL_CONFIG       Alternative to --config flag
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse CLI arguments
    let cli = parse_args();

    // Allow KIRO_POOL_CONFIG env var as alternative to --config flag
    let config_path = std::env::var("KIRO_POOL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or(cli.config_path);

    // 2. Load configuration
    let config = Config::load(&config_path)?;
    config.upstream.validate()?;

    // 3. Initialize tracing/logging
    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        upstream = %config.upstream.base_url,
        "Starting kiro-pool"
    );

    for (key, var) in config.env_overrides.all() {
        tracing::debug!(setting = %key, env_var = %var, "Setting overridden by environment");
    }

    // 4. Open database
    let db = Database::open(&config.database.path)?;
    tracing::info!(path = %config.database.path.display(), "Database opened");

    // 5. Bootstrap operator key (prints the plaintext on first run)
    match bootstrap_operator_key(&db, &config.auth.bootstrap_label) {
        Ok(Some(_)) => {
            tracing::info!("Operator key bootstrapped (first run)");
        }
        Ok(None) => {
            tracing::debug!("Operator key bootstrap skipped (keys already exist)");
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to bootstrap operator key");
            return Err(err.into());
        }
    }

    if config.upstream.service_token.is_empty() {
        tracing::warn!("upstream.service_token is empty -- pool core calls will be unauthenticated");
    }

    // 6. Create the pool-core client
    let pool = Arc::new(PoolClient::new(
        &config.upstream.base_url,
        &config.upstream.service_token,
        config.upstream.timeout_secs,
    ));

    // 7. Create audit channel + spawn background logger
    let (audit_tx, audit_rx) = tokio::sync::mpsc::unbounded_channel();
    let _audit_handle = spawn_audit_logger(db.clone(), audit_rx);
    tracing::debug!("Audit logger spawned");

    // 8. Auth-disabled warning
    if !config.auth.enabled {
        tracing::warn!("Authentication is DISABLED -- all admin routes are open");
    }

    // 9. Build shared application state
    let state = AppState {
        config: Arc::new(config.clone()),
        config_path: config_path.clone(),
        db: db.clone(),
        pool,
        jobs: Arc::new(JobRegistry::new()),
        audit_tx,
    };

    // 10. Build the combined router
    let app = build_app(state.clone());

    // 11. Bind and serve
    let listen_addr = config.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await?;
    tracing::info!(addr = %listen_addr, "Listening");

    println!();
    println!("  kiro-pool v{} is running", env!("CARGO_PKG_VERSION"));
    println!("  Dashboard: http://{listen_addr}/ui/dashboard");
    println!("  Admin API: http://{listen_addr}/admin/");
    println!("  Health:    http://{listen_addr}/health");
    println!();

    // 12. Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 13. Cleanup
    tracing::info!("Shutting down gracefully");
    // The audit_tx sender is dropped with the state here, which causes the
    // audit logger to drain remaining entries and exit.

    Ok(())
}

// ---------------------------------------------------------------------------
// Router assembly
// ---------------------------------------------------------------------------

/// Build the combined application router with all middleware layers.
fn build_app(state: AppState) -> Router {
    let config = &state.config;

    // -- CORS layer -----------------------------------------------------------
    let cors = build_cors_layer(config);

    // -- Request ID layer (X-Request-ID) --------------------------------------
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // -- Tracing layer --------------------------------------------------------
    let trace = TraceLayer::new_for_http();

    // -- API routes (operator auth on /admin) ---------------------------------
    let api_routes = api::build_api_router(state.clone());

    // -- Web UI routes (plain HTML shells) ------------------------------------
    let web_routes = web::build_web_router();

    // -- Combine all routes ---------------------------------------------------
    Router::new()
        .merge(web_routes)
        .merge(api_routes)
        // Global middleware stack (applied to all routes)
        .layer(propagate_id)
        .layer(request_id)
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer from config.
fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.server.cors_origins.is_empty() {
        // Default: allow all origins for development convenience
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

// ---------------------------------------------------------------------------
// Tracing initialization
// ---------------------------------------------------------------------------

/// Set up the tracing subscriber based on configuration.
fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        // Set kiro_pool crate to the configured level, dependencies to warn
        EnvFilter::new(format!("kiro_pool={level},tower_http={level},warn"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

// ---------------------------------------------------------------------------
// Graceful shutdown
// ---------------------------------------------------------------------------

/// Wait for a shutdown signal (SIGTERM or SIGINT / Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C)");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
