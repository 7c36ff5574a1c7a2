use std::fs;

use super::check::{CheckArgs, execute, is_valid};

fn check(model: &str, strict: bool) -> (usize, usize, bool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, model).unwrap();

    let args = CheckArgs {
        model_path: path,
        strict,
        color: false,
    };
    let diagnostics = execute(&args).unwrap();
    (
        diagnostics.error_count(),
        diagnostics.warning_count(),
        is_valid(&diagnostics, args.strict),
    )
}

const WARNS: &str = r#"{"files": [{"name": "W.ice", "modules": [{"name": "W", "definitions": [
  {"kind": "struct", "name": "P", "line": 2, "metadata": ["java:bogus"],
   "members": [{"name": "x", "type": "int"}]}
]}]}]}"#;

#[test]
fn warnings_pass_unless_strict() {
    assert_eq!(check(WARNS, false), (0, 1, true));
    assert_eq!(check(WARNS, true), (0, 1, false));
}

#[test]
fn clean_model() {
    let clean = WARNS.replace(r#""metadata": ["java:bogus"],"#, "");
    assert_eq!(check(&clean, true), (0, 0, true));
}
