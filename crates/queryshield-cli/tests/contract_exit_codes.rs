use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const REPORT: &str = r#"{
  "tests": [
    {"name": "app.tests.BookTests.test_list", "queries_total": 12, "duration_ms": 40.0, "problems": [
      {"type": "N+1", "id": "n+1:app/views.py:10", "sql": "SELECT * FROM author WHERE id = %s", "count": 10,
       "evidence": {"top_stack": [["app/views.py", "book_list", 10]]},
       "suggestion": {"kind": "select_related", "args": {"fields": ["author"]}}},
      {"type": "MISSING_INDEX", "id": "idx:books.author_id", "sql": "SELECT * FROM books WHERE author_id = %s",
       "suggestion": {"kind": "create_index", "ddl": "CREATE INDEX idx_books_author_id ON books (author_id);"}}
    ]},
    {"name": "app.tests.BookTests.test_detail", "queries_total": 2, "problems": []}
  ],
  "budget_violations": [{"test": "app.tests.BookTests.test_list", "type": "queries", "actual": 12, "max": 10}]
}"#;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("queryshield-eval").unwrap();
    cmd.env_remove("QUERYSHIELD_REPORT")
        .env_remove("QUERYSHIELD_BUDGETS")
        .env_remove("QUERYSHIELD_BASELINE")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout must be JSON")
}

#[test]
fn budget_check_exit_0_within_budget() {
    let dir = tempdir().unwrap();
    let budgets = write(dir.path(), "b.yml", "defaults:\n  max_queries: 5\n");
    let report = write(
        dir.path(),
        "r.json",
        r#"{"tests": [{"name": "t", "queries_total": 1, "duration_ms": 1, "problems": []}]}"#,
    );

    cmd()
        .args(["budget-check", "--budgets", &budgets, "--report", &report])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("All budgets met."));
}

#[test]
fn budget_check_exit_2_on_violations() {
    let dir = tempdir().unwrap();
    let budgets = write(dir.path(), "b.yml", "defaults:\n  max_queries: 0\n");
    let report = write(
        dir.path(),
        "r.json",
        r#"{"tests": [{"name": "t", "queries_total": 1, "problems": []}]}"#,
    );

    let out = cmd()
        .args(["budget-check", "--budgets", &budgets, "--report", &report, "--format", "json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["ok"], Value::Bool(false));
    assert_eq!(v["violations"][0]["test"], "t");
    assert_eq!(v["violations"][0]["type"], "max_queries");
    assert_eq!(v["violations"][0]["actual"], 1.0);
    assert_eq!(v["violations"][0]["max"], 0.0);
}

#[test]
fn budget_check_keeps_defaults_next_to_unknown_sections() {
    let dir = tempdir().unwrap();
    let budgets = write(
        dir.path(),
        "b.yml",
        "defaults:\n  max_queries: 0\nmeta:\n  owner: team-db\n",
    );
    let report = write(
        dir.path(),
        "r.json",
        r#"{"tests": [{"name": "t", "queries_total": 1, "problems": []}]}"#,
    );

    cmd()
        .args(["budget-check", "--budgets", &budgets, "--report", &report])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("t  max_queries: 1 > 0"));
}

#[test]
fn budget_check_exit_3_on_missing_budgets() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", REPORT);
    let missing = dir.path().join("no-such.yml");

    cmd()
        .args(["budget-check", "--budgets"])
        .arg(&missing)
        .args(["--report", &report])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid budgets"));
}

#[test]
fn budget_check_exit_3_on_negative_limit() {
    let dir = tempdir().unwrap();
    let budgets = write(dir.path(), "b.yml", "defaults:\n  max_queries: -1\n");
    let report = write(dir.path(), "r.json", REPORT);

    cmd()
        .args(["budget-check", "--budgets", &budgets, "--report", &report])
        .assert()
        .code(3);
}

#[test]
fn validate_exit_3_on_malformed_report() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", r#"{"budget_violations": []}"#);

    cmd()
        .args(["validate", "--report", &report])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("malformed report"));
}

#[test]
fn validate_reports_warnings_but_succeeds() {
    let dir = tempdir().unwrap();
    let report = write(
        dir.path(),
        "r.json",
        r#"{"tests": [{"name": "t", "queries_total": -3}, {"name": "t"}]}"#,
    );

    cmd()
        .args(["validate", "--report", &report])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("W_NEGATIVE_VALUE"))
        .stdout(predicate::str::contains("W_DUPLICATE_TEST"));
}

#[test]
fn missing_report_is_runtime_error() {
    let dir = tempdir().unwrap();
    cmd()
        .args(["validate", "--report"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read report"));
}

#[test]
fn report_path_falls_back_to_env() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", REPORT);

    cmd()
        .env("QUERYSHIELD_REPORT", &report)
        .arg("validate")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Report OK (2 tests)."));
}

#[test]
fn evaluate_json_groups_problems_and_keeps_recorded_violations() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", REPORT);

    let out = cmd()
        .args(["evaluate", "--report", &report, "--format", "json", "--symbol", "test_list"])
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["violation_source"], "reported");
    assert_eq!(v["violations"].as_array().unwrap().len(), 1);
    assert_eq!(v["problems_by_type"][0]["type"], "N+1");
    assert_eq!(v["problems_by_type"][1]["type"], "MISSING_INDEX");
    assert_eq!(
        v["problems_by_type"][0]["occurrences"][0]["fix"],
        r#".select_related("author")"#
    );
    assert_eq!(
        v["problems_by_type"][0]["occurrences"][0]["location"]["file"],
        "app/views.py"
    );
    assert_eq!(v["matches"][0]["symbol"], "test_list");
    assert_eq!(v["matches"][1]["symbol"], Value::Null);
    assert_eq!(v["tests"][0]["status"], "n_plus_one");
    assert_eq!(v["tests"][1]["status"], "pass");
}

#[test]
fn evaluate_fail_on_violations_exits_2() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", REPORT);

    cmd()
        .args(["evaluate", "--report", &report, "--fail-on-violations"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Violations:"))
        .stdout(predicate::str::contains("fix: CREATE INDEX idx_books_author_id ON books (author_id);"));
}

#[test]
fn diff_marks_undefined_percent_for_zero_baseline() {
    let dir = tempdir().unwrap();
    let baseline = write(
        dir.path(),
        "base.json",
        r#"{"tests": [{"name": "app.tests.BookTests.test_list", "queries_total": 0, "problems": []}]}"#,
    );
    let report = write(dir.path(), "r.json", REPORT);

    cmd()
        .args(["diff", "--report", &report, "--baseline", &baseline])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("total_queries: 0 -> 14 (+14, N/A)"))
        .stdout(predicate::str::contains("+ app.tests.BookTests.test_detail"));

    cmd()
        .args(["diff", "--report", &report, "--baseline", &baseline, "--fail-on-regression"])
        .assert()
        .code(2);
}

#[test]
fn fix_prints_rendered_snippet() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", REPORT);

    cmd()
        .args(["fix", "--report", &report, "--id", "idx:books.author_id"])
        .assert()
        .code(0)
        .stdout("CREATE INDEX idx_books_author_id ON books (author_id);\n");

    cmd()
        .args(["fix", "--report", &report, "--id", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no problem with id"));
}

#[test]
fn locate_lists_primary_frames() {
    let dir = tempdir().unwrap();
    let report = write(dir.path(), "r.json", REPORT);

    cmd()
        .args(["locate", "--report", &report, "--symbol", "BookTests.test_detail"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("app.tests.BookTests.test_detail -> BookTests.test_detail"))
        .stdout(predicate::str::contains("app/views.py:10  n+1:app/views.py:10"));
}

#[test]
fn version_prints_package_version() {
    cmd()
        .arg("version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
