/// Integration tests for config environment overrides.
///
/// # Safety
///
/// `std::env::set_var` / `remove_var` are `unsafe` in Rust 2024 edition.
/// All env mutation happens inside a single `#[test]` so no other test in
/// this binary reads the variables concurrently.
use compass::config;
use compass::config::schema::ColorMode;
use compass::gateway::HttpGateway;

/// Helper: set an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn set_env(key: &str, val: &str) {
    unsafe { std::env::set_var(key, val) }
}

/// Helper: remove an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) }
}

#[test]
fn env_vars_override_every_file_layer() {
    // --- API URL and timeout ---
    unsafe { set_env("COMPASS_API_URL", "http://vault.test:9000/api/") };
    unsafe { set_env("COMPASS_TIMEOUT_MS", "1500") };
    let cfg = config::load();
    assert_eq!(cfg.api.base_url, "http://vault.test:9000/api/");
    assert_eq!(cfg.api.timeout_ms, 1500);

    let gateway = HttpGateway::from_config(&cfg.api, false);
    assert_eq!(gateway.base_url(), "http://vault.test:9000/api");

    // --- unparseable timeout is ignored ---
    unsafe { set_env("COMPASS_TIMEOUT_MS", "soon") };
    let cfg = config::load();
    assert_ne!(cfg.api.timeout_ms, 0);
    unsafe { remove_env("COMPASS_TIMEOUT_MS") };
    unsafe { remove_env("COMPASS_API_URL") };

    // --- logging master switch ---
    unsafe { set_env("COMPASS_LOG", "0") };
    let cfg = config::load();
    assert!(!cfg.logging.requests_enabled());
    assert!(!cfg.logging.events_enabled());

    unsafe { set_env("COMPASS_LOG", "on") };
    let cfg = config::load();
    assert!(cfg.logging.enabled);
    unsafe { remove_env("COMPASS_LOG") };

    // --- color ---
    unsafe { set_env("COMPASS_COLOR", "never") };
    assert_eq!(config::load().display.color, ColorMode::Never);
    unsafe { set_env("COMPASS_COLOR", "ALWAYS") };
    assert_eq!(config::load().display.color, ColorMode::Always);
    unsafe { remove_env("COMPASS_COLOR") };
}
