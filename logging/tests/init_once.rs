use bidcheck_logging::{init_with_config, Error, LoggingConfig};

// Kept alone in its own test binary: the global subscriber can be set once
// per process.
#[test]
fn test_second_initialization_fails() {
  let config = LoggingConfig::default();
  init_with_config(&config).unwrap();
  tracing::info!("logging is up");
  log::info!("bridged from the log crate");

  let err = init_with_config(&config).unwrap_err();
  assert!(matches!(err, Error::GlobalSubscriberSet(_)));
}
