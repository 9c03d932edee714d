use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings are overridden by environment variables.
///
/// Overridden settings cannot be edited from the config file without removing
/// the variable first, so the report is logged at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "server.host") is overridden by an env var.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// Get all overrides as a map of setting key -> env var name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Master switch: when false, all admin routes are accessible without a key.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Label attached to the bootstrap-generated operator key.
    #[serde(default = "default_key_label")]
    pub bootstrap_label: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bootstrap_label: default_key_label(),
        }
    }
}

/// Connection settings for the pool-core API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    /// Service token sent as `Authorization: Bearer`.
    #[serde(default)]
    pub service_token: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            service_token: String::new(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// Validate that the base URL parses. Called once at startup.
    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid upstream.base_url '{}': {e}", self.base_url))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Fixed delay between batch items, to stay under upstream rate limits.
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: default_item_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_port() -> u16 {
    8470
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("kiro-pool.db")
}
const fn default_true() -> bool {
    true
}
fn default_key_label() -> String {
    "bootstrap".to_string()
}
fn default_upstream_url() -> String {
    "http://127.0.0.1:9100".to_string()
}
const fn default_upstream_timeout() -> u64 {
    30
}
const fn default_item_delay_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Config loading and env overrides
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides. Any setting prefixed with `KIRO_POOL_` takes precedence over
    /// the file value and is tracked in `env_overrides`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }
        macro_rules! env_path {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = PathBuf::from(val);
                    ov.record($key, $env);
                }
            };
        }

        // -- Server --
        env_str!("server.host", "KIRO_POOL_SERVER_HOST", self.server.host);
        env_parse!("server.port", "KIRO_POOL_SERVER_PORT", self.server.port);
        if let Ok(val) = std::env::var("KIRO_POOL_SERVER_CORS_ORIGINS") {
            self.server.cors_origins = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            ov.record("server.cors_origins", "KIRO_POOL_SERVER_CORS_ORIGINS");
        }

        // -- Database --
        env_path!(
            "database.path",
            "KIRO_POOL_DATABASE_PATH",
            self.database.path
        );

        // -- Auth --
        env_bool!("auth.enabled", "KIRO_POOL_AUTH_ENABLED", self.auth.enabled);

        // -- Upstream --
        env_str!(
            "upstream.base_url",
            "KIRO_POOL_UPSTREAM_URL",
            self.upstream.base_url
        );
        env_str!(
            "upstream.service_token",
            "KIRO_POOL_UPSTREAM_TOKEN",
            self.upstream.service_token
        );
        env_parse!(
            "upstream.timeout_secs",
            "KIRO_POOL_UPSTREAM_TIMEOUT_SECS",
            self.upstream.timeout_secs
        );

        // -- Batch --
        env_parse!(
            "batch.item_delay_ms",
            "KIRO_POOL_BATCH_ITEM_DELAY_MS",
            self.batch.item_delay_ms
        );

        // -- Logging --
        env_str!("logging.level", "KIRO_POOL_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "KIRO_POOL_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8470);
        assert!(config.auth.enabled);
        assert_eq!(config.batch.item_delay_ms, 500);
        assert_eq!(config.upstream.timeout_secs, 30);
    }

    #[test]
    fn test_listen_addr() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "127.0.0.1:8470");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            cors_origins = ["http://localhost:5173"]

            [database]
            path = "/var/lib/kiro-pool/pool.db"

            [auth]
            enabled = false

            [upstream]
            base_url = "https://pool.internal:9100"
            service_token = "svc-abc"
            timeout_secs = 10

            [batch]
            item_delay_ms = 250

            [logging]
            level = "debug"
            json = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(!config.auth.enabled);
        assert_eq!(config.upstream.base_url, "https://pool.internal:9100");
        assert_eq!(config.upstream.service_token, "svc-abc");
        assert_eq!(config.batch.item_delay_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [upstream]
            base_url = "http://pool:9100"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8470);
        assert_eq!(config.upstream.base_url, "http://pool:9100");
        assert_eq!(config.upstream.timeout_secs, 30);
    }

    #[test]
    fn test_upstream_validate_rejects_garbage() {
        let upstream = UpstreamConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(upstream.validate().is_err());

        let ok = UpstreamConfig::default();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_env_override_is_tracked() {
        // SAFETY: test-only env mutation; the var name is unique to this test.
        unsafe { std::env::set_var("KIRO_POOL_UPSTREAM_URL", "http://other:9200") };
        let mut config = Config::default();
        config.apply_env_overrides();
        unsafe { std::env::remove_var("KIRO_POOL_UPSTREAM_URL") };

        assert_eq!(config.upstream.base_url, "http://other:9200");
        assert!(config.env_overrides.is_overridden("upstream.base_url"));
        assert_eq!(
            config.env_overrides.env_var_for("upstream.base_url"),
            Some("KIRO_POOL_UPSTREAM_URL")
        );
        assert!(!config.env_overrides.is_overridden("server.host"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/kiro-pool.toml")).unwrap();
        assert_eq!(config.server.port, 8470);
    }
}
