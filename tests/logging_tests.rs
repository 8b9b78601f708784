#![allow(clippy::unwrap_used, clippy::expect_used)]

use apireg::logging::{init_logging, LogConfig, LogFormat};

#[test]
fn test_second_init_is_rejected() {
    let config = LogConfig {
        log_level: "warn".to_owned(),
        format: LogFormat::Pretty,
        target_filter: None,
    };

    init_logging(&config).unwrap();
    let err = init_logging(&config).unwrap_err();
    assert!(err.to_string().contains("Failed to initialize logging"));
}
