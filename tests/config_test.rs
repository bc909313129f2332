/// Tests for layered configuration loading

use failure_predictor::{config::Config, data::LabelRule, profiles::ProfileKind};
use std::fs;
use tempfile::TempDir;
use validator::Validate;

#[test]
fn test_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("local.toml");
    fs::write(
        &path,
        r#"
[pipeline]
profile = "turbine"
seed = 7
max_depth = 4

[turbine]
rows = 250
label_rule = "generated-columns"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.pipeline.profile, ProfileKind::Turbine);
    assert_eq!(config.pipeline.seed, 7);
    assert_eq!(config.pipeline.max_depth, Some(4));
    // Untouched keys keep their defaults
    assert_eq!(config.pipeline.test_size, 0.2);
    assert_eq!(config.turbine.rows, 250);
    assert_eq!(config.turbine.label_rule, LabelRule::GeneratedColumns);
    assert!(config.validate().is_ok());
}

#[test]
fn test_out_of_range_file_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[pipeline]\ntest_size = 0.0\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_label_rule_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rule.toml");
    fs::write(&path, "[turbine]\nlabel_rule = \"coin-flip\"\n").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}
