//! Planner configuration: environment, TOML file and builder layering.
//!
//! Environment tests share process state and run under `#[serial(flexgemm_env)]`.

use std::env;
use std::fs;

use flexgemm_plan::config::{ENV_VERIFY_DIVISORS, ENV_VERIFY_LIMIT};
use flexgemm_plan::{ConfigBuilder, PlanError, PlannerConfig};
use serial_test::serial;
use tempfile::TempDir;

/// Restores an environment variable on drop.
struct EnvGuard {
    key: String,
    old: Option<String>,
}

impl EnvGuard {
    fn new(key: &str) -> Self {
        Self { key: key.to_string(), old: env::var(key).ok() }
    }

    fn set(key: &str, val: &str) -> Self {
        let guard = Self::new(key);
        unsafe {
            env::set_var(key, val);
        }
        guard
    }

    fn clear(key: &str) -> Self {
        let guard = Self::new(key);
        unsafe {
            env::remove_var(key);
        }
        guard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            if let Some(ref v) = self.old {
                env::set_var(&self.key, v);
            } else {
                env::remove_var(&self.key);
            }
        }
    }
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("flexgemm.toml");
    fs::write(&path, body).expect("write config");
    path
}

#[test]
#[serial(flexgemm_env)]
fn test_env_unset_gives_defaults() {
    let _g1 = EnvGuard::clear(ENV_VERIFY_DIVISORS);
    let _g2 = EnvGuard::clear(ENV_VERIFY_LIMIT);

    let config = ConfigBuilder::new().from_env().and_then(ConfigBuilder::build).expect("config");
    assert_eq!(config, PlannerConfig::default());
}

#[test]
#[serial(flexgemm_env)]
fn test_env_enables_verification() {
    let _g1 = EnvGuard::set(ENV_VERIFY_DIVISORS, "1");
    let _g2 = EnvGuard::set(ENV_VERIFY_LIMIT, "65536");

    let config = ConfigBuilder::new().from_env().and_then(ConfigBuilder::build).expect("config");
    assert!(config.verify_divisors);
    assert_eq!(config.verify_limit, 65_536);
}

#[test]
#[serial(flexgemm_env)]
fn test_env_accepts_true_spelling() {
    let _g1 = EnvGuard::set(ENV_VERIFY_DIVISORS, "True");
    let _g2 = EnvGuard::clear(ENV_VERIFY_LIMIT);

    let config = ConfigBuilder::new().from_env().and_then(ConfigBuilder::build).expect("config");
    assert!(config.verify_divisors);
}

#[test]
#[serial(flexgemm_env)]
fn test_env_rejects_garbage() {
    let _g1 = EnvGuard::clear(ENV_VERIFY_DIVISORS);
    let _g2 = EnvGuard::set(ENV_VERIFY_LIMIT, "lots");

    let err = ConfigBuilder::new().from_env().expect_err("invalid limit");
    assert!(matches!(err, PlanError::Config(_)));

    let _g3 = EnvGuard::set(ENV_VERIFY_DIVISORS, "sometimes");
    let _g4 = EnvGuard::clear(ENV_VERIFY_LIMIT);
    let err = ConfigBuilder::new().from_env().expect_err("invalid flag");
    assert!(err.to_string().contains(ENV_VERIFY_DIVISORS));
}

#[test]
#[serial(flexgemm_env)]
fn test_file_applied_after_env_wins() {
    let _g1 = EnvGuard::set(ENV_VERIFY_DIVISORS, "1");
    let _g2 = EnvGuard::set(ENV_VERIFY_LIMIT, "100");

    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[planner]\nverify_limit = 2048\n");

    let config = ConfigBuilder::new()
        .from_env()
        .and_then(|b| b.from_file(&path))
        .and_then(ConfigBuilder::build)
        .expect("config");
    // Env value survives where the file is silent.
    assert!(config.verify_divisors);
    assert_eq!(config.verify_limit, 2048);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.toml");

    let err = ConfigBuilder::new().from_file(&path).expect_err("missing file");
    match err {
        PlanError::ConfigIo { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ConfigIo, got {other:?}"),
    }
}

#[test]
fn test_file_with_wrong_type_is_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[planner]\nverify_divisors = \"yes\"\n");

    let err = ConfigBuilder::new().from_file(&path).expect_err("wrong type");
    assert!(matches!(err, PlanError::ConfigParse(_)));
}

#[test]
fn test_explicit_setters_override_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[planner]\nverify_divisors = true\nverify_limit = 10\n");

    let config = ConfigBuilder::new()
        .from_file(&path)
        .map(|b| b.verify_divisors(false))
        .and_then(ConfigBuilder::build)
        .expect("config");
    assert!(!config.verify_divisors);
    assert_eq!(config.verify_limit, 10);
}
