use std::{env, time::Duration};

/// AppConfig
///
/// Holds the portal's entire configuration state. Loaded once at startup and
/// shared immutably through `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and cookie hardening.
    pub env: Env,
    // Base URL of the REST backend (the `/api/...` endpoints live below it).
    pub backend_url: String,
    // Full URL of the GraphQL endpoint.
    pub graphql_url: String,
    // Socket address the portal listens on.
    pub bind_addr: String,
    // Marks the session cookies `Secure`.
    pub cookie_secure: bool,
    // Upper bound for every backend call.
    pub request_timeout: Duration,
    // Quiet period before a live search query is issued.
    pub search_debounce: Duration,
}

/// Env
///
/// Defines the runtime context: pretty logs and relaxed cookies locally,
/// JSON logs and mandatory settings in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DEBOUNCE_MS: u64 = 500;

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            graphql_url: format!("{DEFAULT_BACKEND_URL}/graphql"),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cookie_secure: false,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, failing fast on
    /// anything production cannot run without.
    ///
    /// # Panics
    /// Panics in production when `BACKEND_URL` is not set.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let backend_url = match env {
            Env::Production => {
                env::var("BACKEND_URL").expect("FATAL: BACKEND_URL must be set in production.")
            }
            Env::Local => {
                env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
            }
        };
        let backend_url = backend_url.trim_end_matches('/').to_string();

        let graphql_url =
            env::var("GRAPHQL_URL").unwrap_or_else(|_| format!("{backend_url}/graphql"));

        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or(env == Env::Production);

        Self {
            backend_url,
            graphql_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            cookie_secure,
            request_timeout: Duration::from_secs(
                env_number("REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            search_debounce: Duration::from_millis(
                env_number("SEARCH_DEBOUNCE_MS").unwrap_or(DEFAULT_DEBOUNCE_MS),
            ),
            env,
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_number(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}
