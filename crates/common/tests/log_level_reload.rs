//! Runtime level changes against an installed subscriber.
//!
//! Lives in its own test binary: the subscriber is process-global.

use glider_common::config::LoggingConfig;
use glider_common::logging::{init_logging, set_log_level, LogLevel};
use tracing::Level;

#[test]
fn set_log_level_swaps_the_installed_filter() {
    let dir = std::env::temp_dir().join(format!("glider_test_log_reload_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let log_file = dir.join("mouse_movement.log");

    init_logging(&LoggingConfig {
        level: "info".to_string(),
        json: false,
        file: Some(log_file.clone()),
    });
    let read_log = || std::fs::read_to_string(&log_file).unwrap_or_default();

    set_log_level(LogLevel::None).unwrap();
    assert!(!tracing::enabled!(Level::ERROR));
    tracing::error!("marker-while-off");
    assert!(!read_log().contains("marker-while-off"));

    set_log_level(LogLevel::Debug).unwrap();
    assert!(tracing::enabled!(Level::DEBUG));
    tracing::debug!("marker-debug");
    assert!(read_log().contains("marker-debug"));

    set_log_level(LogLevel::Error).unwrap();
    assert!(!tracing::enabled!(Level::INFO));
    tracing::info!("marker-info-under-error");
    tracing::error!("marker-error");
    let log = read_log();
    assert!(!log.contains("marker-info-under-error"));
    assert!(log.contains("marker-error"));

    std::fs::remove_dir_all(&dir).ok();
}
