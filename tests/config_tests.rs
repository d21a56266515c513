use edu_portal::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic, time::Duration};

const CONFIG_VARS: [&str; 7] = [
    "APP_ENV",
    "BACKEND_URL",
    "GRAPHQL_URL",
    "BIND_ADDR",
    "COOKIE_SECURE",
    "REQUEST_TIMEOUT_SECS",
    "SEARCH_DEBOUNCE_MS",
];

// --- Setup/Teardown Utilities ---

/// Clears every config variable, runs the test, then restores the originals.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_production_requires_backend_url() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without BACKEND_URL"
    );
}

#[test]
#[serial]
fn test_local_defaults() {
    let config = run_with_env(AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.backend_url, "http://localhost:3001");
    assert_eq!(config.graphql_url, "http://localhost:3001/graphql");
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert!(!config.cookie_secure);
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.search_debounce, Duration::from_millis(500));
}

#[test]
#[serial]
fn test_production_settings() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("BACKEND_URL", "https://api.school.edu/");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    // Trailing slash is trimmed before the GraphQL URL is derived.
    assert_eq!(config.backend_url, "https://api.school.edu");
    assert_eq!(config.graphql_url, "https://api.school.edu/graphql");
    assert!(config.cookie_secure, "Production cookies default to Secure");
}

#[test]
#[serial]
fn test_explicit_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("BACKEND_URL", "http://backend:4000");
            env::set_var("GRAPHQL_URL", "http://graph:4001/gql");
            env::set_var("BIND_ADDR", "127.0.0.1:8080");
            env::set_var("COOKIE_SECURE", "yes");
            env::set_var("REQUEST_TIMEOUT_SECS", "3");
            env::set_var("SEARCH_DEBOUNCE_MS", "250");
        }
        AppConfig::load()
    });

    assert_eq!(config.graphql_url, "http://graph:4001/gql");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert!(config.cookie_secure);
    assert_eq!(config.request_timeout, Duration::from_secs(3));
    assert_eq!(config.search_debounce, Duration::from_millis(250));
}

#[test]
#[serial]
fn test_unparseable_numbers_fall_back() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("REQUEST_TIMEOUT_SECS", "soon");
            env::set_var("COOKIE_SECURE", "maybe");
        }
        AppConfig::load()
    });

    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert!(!config.cookie_secure);
}
