//! Resolver configuration applied end to end

use clet_resolve::{DeclarationError, RedeclarationPolicy, ResolveError, ResolverConfig};
use integration_tests::Suite;
use std::io::Write;

fn config_from(contents: &str) -> ResolverConfig {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    ResolverConfig::from_file(file.path()).expect("config loads")
}

#[test]
fn test_reject_policy_from_file() {
    let config = config_from("redeclaration = \"reject\"\n");
    assert_eq!(config.redeclaration, RedeclarationPolicy::Reject);

    let mut suite = Suite::with_config(config);
    let root = suite.root();
    suite
        .tree
        .declare(root, "count", |_| Ok(1))
        .expect("first declaration");

    let error = suite
        .tree
        .declare(root, "count", |_| Ok(2))
        .expect_err("second declaration is rejected");
    assert_eq!(
        error,
        DeclarationError::Duplicate {
            name: "count".to_string(),
            scope: root,
        }
    );
    assert_eq!(suite.read(root, "count").expect("original survives"), 1);
}

#[test]
fn test_overwrite_policy_resets_evaluated_value() {
    let mut suite = Suite::with_config(config_from(""));
    let root = suite.root();
    suite
        .tree
        .declare(root, "count", |_| Ok(1))
        .expect("first declaration");
    assert_eq!(suite.read(root, "count").expect("first value"), 1);

    suite
        .tree
        .declare(root, "count", |_| Ok(2))
        .expect("overwrite");
    assert!(!suite.tree.is_evaluated(root, "count"));
    assert_eq!(suite.read(root, "count").expect("second value"), 2);
}

#[test]
fn test_suggestions_can_be_disabled() {
    let mut suite = Suite::with_config(config_from("[suggestions]\nlimit = 0\n"));
    let root = suite.root();
    suite
        .tree
        .declare(root, "count", |_| Ok(1))
        .expect("declare count");

    let error = suite
        .run(root, "misspells", |example| Ok(example.get("cuont")))
        .expect("example runs")
        .expect_err("name is misspelled");
    match error {
        ResolveError::UndeclaredName { suggestions, .. } => assert!(suggestions.is_empty()),
        other => panic!("expected undeclared name, got {other:?}"),
    }
}

#[test]
fn test_default_suggestions() {
    let mut suite = Suite::new();
    let root = suite.root();
    suite
        .tree
        .declare(root, "count", |_| Ok(1))
        .expect("declare count");

    let error = suite.read(root, "cuont").expect_err("name is misspelled");
    assert_eq!(
        error.to_string(),
        "undeclared name `cuont` read from scope #0 (did you mean `count`?)"
    );
}
