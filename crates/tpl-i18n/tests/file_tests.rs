//! File adapter tests

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tpl_i18n::{transform_from_file, SequentialKeys, TplI18nError, Transformer};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn policy() -> SequentialKeys {
    SequentialKeys::new("node_test_", "{[ this.{key} ]}")
}

#[test]
fn test_transform_from_file() {
    let result = transform_from_file(fixture("demo.tpl"), policy()).unwrap();

    assert_eq!(
        result.code,
        "<div class=\"demo\">\n  <h1>{[ this.node_test_1 ]}</h1>\n  <input type=\"text\" placeholder=\"{[ this.node_test_2 ]}\" />\n</div>\n"
    );
    let entries: Vec<_> = result
        .lang_map
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(entries, [("node_test_1", "hello"), ("node_test_2", "请输入")]);
}

#[test]
fn test_relative_path_uses_current_dir() {
    // Cargo runs integration tests from the package root.
    let result = transform_from_file("tests/fixtures/demo.tpl", policy()).unwrap();
    assert_eq!(result.lang_map.len(), 2);
}

#[test]
fn test_missing_file_keeps_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.tpl");

    let err = transform_from_file(&missing, policy()).unwrap_err();
    match err {
        TplI18nError::IoError(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected IoError, got {other:?}"),
    }
}

#[test]
fn test_transformer_counts_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let second = dir.path().join("second.tpl");
    std::fs::write(&second, "<p><lang>world</lang></p>").unwrap();

    let mut transformer = Transformer::new(policy());
    transformer.transform_file(fixture("demo.tpl")).unwrap();
    let result = transformer.transform_file(&second).unwrap();

    assert_eq!(result.code, "<p>{[ this.node_test_3 ]}</p>");
    assert_eq!(result.lang_map["node_test_3"], "world");
}
