//! Environment overrides are process-wide, so they live in their own test
//! binary with a single test that sets and unsets them in sequence.

use evalgraph_core::{ConfigError, ConfigManager};
use std::fs;
use tempfile::TempDir;

const VARS: [&str; 4] = [
    "EVALGRAPH_USE_COPY_ON_WRITE",
    "EVALGRAPH_PARALLEL_THRESHOLD",
    "EVALGRAPH_LOG_LEVEL",
    "EVALGRAPH_LOG_FORMAT",
];

/// Removes every override on drop, also when an assertion fails.
struct EnvGuard;

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
}

#[test]
fn test_environment_overrides_config_file() -> anyhow::Result<()> {
    let _guard = EnvGuard;
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("evalgraph.toml");
    fs::write(
        &config_path,
        r#"
[flush]
use_copy_on_write = true
parallel_threshold = 1024

[logging]
level = "info"
format = "pretty"
"#,
    )?;

    // File only.
    let manager = ConfigManager::from_path(&config_path)?;
    assert_eq!(manager.config().flush.parallel_threshold, 1024);
    assert!(manager.config().flush.use_copy_on_write);

    // Environment wins over the file.
    std::env::set_var("EVALGRAPH_PARALLEL_THRESHOLD", "7");
    std::env::set_var("EVALGRAPH_USE_COPY_ON_WRITE", "off");
    std::env::set_var("EVALGRAPH_LOG_LEVEL", "debug");
    std::env::set_var("EVALGRAPH_LOG_FORMAT", "json");
    let manager = ConfigManager::from_path(&config_path)?;
    let config = manager.config();
    assert_eq!(config.flush.parallel_threshold, 7);
    assert!(!config.flush.use_copy_on_write);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");

    // Unparsable values are parse errors naming the variable.
    std::env::set_var("EVALGRAPH_USE_COPY_ON_WRITE", "maybe");
    match ConfigManager::from_path(&config_path) {
        Err(ConfigError::ParseError(msg)) => {
            assert_eq!(msg, "EVALGRAPH_USE_COPY_ON_WRITE=maybe")
        }
        other => panic!("expected ParseError, got {:?}", other),
    }
    std::env::set_var("EVALGRAPH_USE_COPY_ON_WRITE", "1");

    std::env::set_var("EVALGRAPH_PARALLEL_THRESHOLD", "lots");
    assert!(matches!(
        ConfigManager::from_path(&config_path),
        Err(ConfigError::ParseError(_))
    ));

    // Overrides are validated like file values.
    std::env::set_var("EVALGRAPH_PARALLEL_THRESHOLD", "0");
    assert!(matches!(
        ConfigManager::from_path(&config_path),
        Err(ConfigError::ValidationError(_))
    ));
    std::env::set_var("EVALGRAPH_PARALLEL_THRESHOLD", "64");
    std::env::set_var("EVALGRAPH_LOG_LEVEL", "loud");
    assert!(matches!(
        ConfigManager::from_path(&config_path),
        Err(ConfigError::ValidationError(_))
    ));

    // Without overrides the file values come back.
    for var in VARS {
        std::env::remove_var(var);
    }
    let manager = ConfigManager::from_path(&config_path)?;
    assert_eq!(manager.config().flush.parallel_threshold, 1024);
    assert!(manager.config().flush.use_copy_on_write);
    Ok(())
}
