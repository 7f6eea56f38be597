use bidcheck_logging::{find_config_file_in, load_from_file, Error, OutputFormat};
use pretty_assertions::assert_eq;
use std::fs;
use tracing_subscriber::filter::LevelFilter;

#[test]
fn test_load_full_config() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("bidcheck_logging.yaml");
  fs::write(
    &path,
    r#"
version: 1
level: debug
format: json
targets:
  bidcheck_cache: trace
  hyper: warn
with_thread_names: true
bridge_log: false
"#,
  )
  .unwrap();

  let config = load_from_file(&path).unwrap();
  assert_eq!(config.level, LevelFilter::DEBUG);
  assert_eq!(config.format, OutputFormat::Json);
  assert_eq!(
    config.targets,
    vec![
      ("bidcheck_cache".to_string(), LevelFilter::TRACE),
      ("hyper".to_string(), LevelFilter::WARN),
    ]
  );
  assert!(config.with_thread_names);
  assert!(!config.bridge_log);
  assert!(!config.ansi, "JSON output never carries ANSI escapes");
}

#[test]
fn test_unknown_field_is_a_parse_error() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("bidcheck_logging.yaml");
  fs::write(&path, "level: info\ncolour: true\n").unwrap();

  let err = load_from_file(&path).unwrap_err();
  assert!(matches!(err, Error::ConfigParse(_)), "got {:?}", err);
}

#[test]
fn test_missing_file_is_a_read_error() {
  let dir = tempfile::tempdir().unwrap();
  let err = load_from_file(&dir.path().join("nope.yaml")).unwrap_err();
  assert!(matches!(err, Error::ConfigRead(_)));
}

#[test]
fn test_environment_specific_file_is_preferred() {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("bidcheck_logging.yaml"), "level: info\n").unwrap();
  fs::write(dir.path().join("bidcheck_logging.staging.yaml"), "level: warn\n").unwrap();

  let found = find_config_file_in(dir.path(), Some("staging")).unwrap();
  assert_eq!(found, dir.path().join("bidcheck_logging.staging.yaml"));

  let fallback = find_config_file_in(dir.path(), Some("prod")).unwrap();
  assert_eq!(fallback, dir.path().join("bidcheck_logging.yaml"));
}

#[test]
fn test_no_config_file_found() {
  let dir = tempfile::tempdir().unwrap();
  let err = find_config_file_in(dir.path(), Some("dev")).unwrap_err();
  assert!(matches!(err, Error::ConfigNotFound(_)));
}
