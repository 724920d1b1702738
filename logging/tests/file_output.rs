use gallery_logging::{build_dispatch, LoggingConfig};

fn read_logs(dir: &std::path::Path) -> String {
  std::fs::read_dir(dir)
    .unwrap()
    .filter_map(Result::ok)
    .map(|entry| std::fs::read_to_string(entry.path()).unwrap())
    .collect()
}

#[test]
fn test_file_output_is_flushed_when_guard_drops() {
  let dir = tempfile::tempdir().unwrap();
  let yaml = format!(
    "level: info\nconsole: false\nfile:\n  directory: {}\n  rotation: never\n",
    dir.path().join("logs").display()
  );
  let config = LoggingConfig::from_yaml_str(&yaml).unwrap();

  let (dispatch, guard) = build_dispatch(&config).unwrap();
  assert!(guard.has_file_output());
  tracing::dispatcher::with_default(&dispatch, || {
    tracing::info!(key = "abc", "disk write-back failed");
    tracing::debug!("below the configured level");
  });
  drop(guard);

  let logs = read_logs(&dir.path().join("logs"));
  assert!(logs.contains("disk write-back failed"), "logs: {logs}");
  assert!(logs.contains("key=\"abc\""), "logs: {logs}");
  assert!(!logs.contains("below the configured level"));
}

#[test]
fn test_json_format_and_target_directives() {
  let dir = tempfile::tempdir().unwrap();
  let yaml = format!(
    "level: warn\nfilter: ['file_output=debug']\nformat: json\nconsole: false\nfile:\n  directory: {}\n  rotation: never\n",
    dir.path().display()
  );
  let config = LoggingConfig::from_yaml_str(&yaml).unwrap();

  let (dispatch, guard) = build_dispatch(&config).unwrap();
  tracing::dispatcher::with_default(&dispatch, || {
    tracing::debug!(target: "file_output", "allowed by directive");
    tracing::debug!(target: "elsewhere", "filtered by level");
  });
  drop(guard);

  let logs = read_logs(dir.path());
  let lines: Vec<&str> = logs.lines().collect();
  assert_eq!(lines.len(), 1, "logs: {logs}");
  assert!(lines[0].starts_with('{'));
  assert!(lines[0].contains("allowed by directive"));
}
