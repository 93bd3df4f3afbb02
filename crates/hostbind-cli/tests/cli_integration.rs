//! Integration tests for the `hostbind` binary.
//!
//! Each test lays out a small crate in a temp dir and drives the CLI against it.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const LIB: &str = r#"
pub mod shapes;

use hostbind_sdk::script_registry;

#[script_registry]
pub struct Builtins;
"#;

const SHAPES: &str = r#"
use hostbind_sdk::{script_methods, script_type};

#[script_type(is_abstract)]
pub struct Shape {
    #[script_property(read_only)]
    pub id: u32,
}

#[script_type(base = Shape)]
pub struct Circle {
    #[script_property]
    pub radius: f64,
}

#[script_methods]
impl Circle {
    #[script_constructor]
    pub fn new(radius: f64) -> Self {
        Circle { radius }
    }

    #[script_method]
    pub fn scale(&mut self, #[script_default(2.0)] factor: f64) {
        self.radius *= factor;
    }
}
"#;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, text) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn hostbind(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hostbind"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn hostbind")
}

#[test]
fn test_generate_writes_tables_and_manifest() {
    let dir = project(&[("src/lib.rs", LIB), ("src/shapes.rs", SHAPES)]);

    let output = hostbind(
        &["generate", "src", "--out", "out", "--manifest", "bindings.json"],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = dir.path().join("out");
    for name in ["Shape.rs", "Circle.rs", "__registry.rs"] {
        let code = fs::read_to_string(out.join(name)).unwrap();
        assert!(code.starts_with("// @generated"), "{name} lacks the header");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generated 2 type(s) + registry"), "stdout: {stdout}");

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("bindings.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["anchor"], "Builtins");
    let circle = &manifest["types"][1];
    assert_eq!(circle["name"], "Circle");
    assert_eq!(circle["base"], "Shape");
    assert_eq!(circle["rust_path"], "crate::shapes::Circle");
    let members: Vec<&str> = circle["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(members, ["radius", "scale"]);
}

#[test]
fn test_generate_twice_leaves_files_unchanged() {
    let dir = project(&[("src/lib.rs", LIB), ("src/shapes.rs", SHAPES)]);

    assert!(hostbind(&["generate", "src", "-o", "out"], dir.path()).status.success());
    let output = hostbind(&["generate", "src", "-o", "out"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 written, 3 unchanged, 0 removed"), "stdout: {stdout}");
}

#[test]
fn test_check_prints_summary() {
    let dir = project(&[("src/lib.rs", LIB), ("src/shapes.rs", SHAPES)]);

    let output = hostbind(&["check", "src"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Shape (crate::shapes::Shape) [abstract]"), "stdout: {stdout}");
    assert!(stdout.contains("Circle (crate::shapes::Circle) : Shape"));
    assert!(stdout.contains("Registry anchor: Builtins"));
    assert!(stdout.contains("OK: 2 type(s)"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_check_json_is_the_manifest() {
    let dir = project(&[("src/lib.rs", LIB), ("src/shapes.rs", SHAPES)]);

    let output = hostbind(&["check", "--json", "src"], dir.path());
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(manifest["types"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["types"][0]["is_abstract"], true);
}

#[test]
fn test_duplicate_member_fails() {
    let dir = project(&[(
        "src/lib.rs",
        r#"
        use hostbind_sdk::{script_methods, script_type};

        #[script_type]
        pub struct Counter {
            #[script_property] pub value: i64,
        }

        #[script_methods]
        impl Counter {
            #[script_method(name = "value")]
            pub fn current(&self) -> i64 { self.value }
        }
        "#,
    )]);

    let output = hostbind(&["check", "src"], dir.path());
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: check failed"), "stderr: {stderr}");
    assert!(stderr.contains("duplicate exposed member `value`"));
}

#[test]
fn test_missing_source_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = hostbind(&["generate", "nowhere", "-o", "out"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("source `nowhere` does not exist"));
}
