use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn ttcn3_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ttcn3"));
    cmd.env_remove("NTT_PRESETS").env_remove("RUST_LOG");
    cmd
}

const MANIFEST: &str = indoc! {"
    name: demo
    sources:
      - src
    hooks_file: hooks.sh
    variables:
      SUT: localhost
    parameters:
      global:
        timeout: 1
      test_configs:
        - test: demo.t1
          parameters:
            timeout: 5
      presets:
        slow:
          - test: '*'
            parameters:
              timeout: 30
"};

const DEMO: &str = indoc! {"
    module demo {
      testcase t1() runs on C {}
      testcase t2() runs on C {}
      control { execute(t1()); }
    }
"};

/// A project directory with `package.yml` and `src/demo.ttcn3`.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.yml"), MANIFEST).unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/demo.ttcn3"), DEMO).unwrap();
    dir
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// PARSE
// ============================================================================

#[test]
fn test_parse_valid_files() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ttcn3", "module A {}");
    let b = write(dir.path(), "b.ttcn3", "module B { import from A all; }");

    ttcn3_cmd()
        .arg("parse")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stderr(predicate::str::contains(": error:").not());
}

#[test]
fn test_parse_reports_syntax_errors() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "good.ttcn3", "module A {}");
    let bad = write(dir.path(), "bad.ttcn3", "module B {\n  testcase t() {\n");

    ttcn3_cmd()
        .arg("parse")
        .arg(&good)
        .arg(&bad)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(format!("{}:", bad.display())))
        .stderr(predicate::str::contains(": error: "))
        .stderr(predicate::str::contains(format!("{}:", good.display())).not());
}

#[test]
fn test_parse_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ttcn3", "module A {}");
    write(dir.path(), "b.ttcn", "module B {");
    write(dir.path(), "notes.txt", "module C {");

    ttcn3_cmd()
        .arg("parse")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("b.ttcn:"))
        .stderr(predicate::str::contains("notes.txt").not());
}

#[test]
fn test_parse_missing_file() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ttcn3", "module A {}");

    ttcn3_cmd()
        .arg("parse")
        .arg(&a)
        .arg(dir.path().join("gone.ttcn3"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("gone.ttcn3: error:"));
}

#[test]
fn test_parse_trace_and_jobs() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ttcn3", "module A { const integer x := 1; }");

    ttcn3_cmd()
        .args(["parse", "-t", "-j", "1"])
        .arg(&a)
        .assert()
        .success()
        .stderr(predicate::str::contains("TRACE"));
}

#[test]
fn test_parse_requires_files() {
    ttcn3_cmd().arg("parse").assert().failure();
}

// ============================================================================
// SHOW
// ============================================================================

#[test]
fn test_show_default_keys() {
    let dir = project();
    let root = dir.path().canonicalize().unwrap().display().to_string();

    ttcn3_cmd()
        .current_dir(dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("NTT_NAME=\"demo\"\n"))
        .stdout(predicate::str::contains(format!("NTT_ROOT=\"{}\"\n", root)))
        .stdout(predicate::str::contains(format!("NTT_SOURCES=\"{}/src\"\n", root)))
        .stdout(predicate::str::contains(format!(
            "NTT_HOOKS_FILE=\"{}/hooks.sh\"\n",
            root
        )))
        .stdout(predicate::str::contains("NTT_IMPORTS").not())
        .stdout(predicate::str::contains("NTT_LINT_FILE").not());
}

#[test]
fn test_show_keys() {
    let dir = project();

    ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--", "name", "variables", "parameters.global.timeout"])
        .assert()
        .success()
        .stdout("demo\n'SUT=localhost'\n1\n");
}

#[test]
fn test_show_unknown_key() {
    let dir = project();

    ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--", "nonsense"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key \"nonsense\" not found"));
}

#[test]
fn test_show_json_without_presets() {
    let dir = project();

    let output = ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "demo");
    assert_eq!(json["env"][0], "SUT=localhost");
    assert!(json["files"][0]
        .as_str()
        .unwrap()
        .ends_with("src/demo.ttcn3"));

    let execute = json["parameters"]["execute"].as_array().unwrap();
    let names: Vec<&str> = execute.iter().map(|c| c["test"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["demo.t1", "demo.t2", "demo.control"]);
    assert_eq!(execute[0]["parameters"]["timeout"], 5);
    assert_eq!(execute[1]["parameters"]["timeout"], 1);
}

#[test]
fn test_show_json_applies_presets() {
    let dir = project();

    let output = ttcn3_cmd()
        .current_dir(dir.path())
        .env("NTT_PRESETS", "slow")
        .args(["show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let execute = json["parameters"]["execute"].as_array().unwrap();
    assert!(execute.iter().all(|c| c["parameters"]["timeout"] == 30));
}

#[test]
fn test_show_json_unknown_preset() {
    let dir = project();

    ttcn3_cmd()
        .current_dir(dir.path())
        .env("NTT_PRESETS", "nope")
        .args(["show", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("preset \"nope\" not found"));
}

#[test]
fn test_show_json_reports_unreadable_sources() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ttcn3", "module A { testcase t() {} }");
    let b = dir.path().join("b.ttcn3");
    fs::write(&b, [0xff, 0xfe, 0x00]).unwrap();

    let output = ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--json"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains(&b.display().to_string()));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let execute = json["parameters"]["execute"].as_array().unwrap();
    let names: Vec<&str> = execute.iter().map(|c| c["test"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["A.t"]);
}

#[test]
fn test_show_json_rejects_keys() {
    let dir = project();

    ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--json", "--", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--json does not accept"));
}

#[test]
fn test_show_shell_script() {
    let dir = project();
    let root = dir.path().canonicalize().unwrap().display().to_string();

    ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export K3_NAME='demo'"))
        .stdout(predicate::str::contains(format!("export K3_SOURCE_DIR='{}'", root)))
        .stdout(predicate::str::contains("export 'SUT=localhost'"))
        .stdout(predicate::str::contains(format!(
            "K3_TTCN3_FILES=(\n\t{}/src/demo.ttcn3\n)",
            root
        )));
}

#[test]
fn test_show_shell_script_reports_missing_sources() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.yml"), "name: broken\nsources: [gone]\n").unwrap();

    ttcn3_cmd()
        .current_dir(dir.path())
        .args(["show", "--sh"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("read -r -d '' K3_ERROR <<'EOF'"))
        .stdout(predicate::str::contains("\nfalse\n"));
}

#[test]
fn test_show_loose_files() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.ttcn3", "module A { testcase t() {} }");

    ttcn3_cmd()
        .current_dir(dir.path())
        .arg("show")
        .arg(&a)
        .arg("--")
        .arg("sources")
        .assert()
        .success()
        .stdout(format!("{}\n", a.display()));
}
