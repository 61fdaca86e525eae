//! End-to-end runs of the `vertex` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn vertex(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vertex"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run vertex")
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("go.mod"), "module example.com/notes\n\ngo 1.22\n").unwrap();
    fs::create_dir_all(dir.path().join("notes")).unwrap();
    fs::write(
        dir.path().join("notes/notes.go"),
        "package notes\n\n// Titles lists note titles.\n// @server path=/titles method=GET\nfunc Titles() ([]string, error) {\n\treturn nil, nil\n}\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_generates_into_custom_output_and_package() {
    let dir = project();
    let input = dir.path().to_str().unwrap();
    let output = dir.path().join("out");

    let result = vertex(&[
        "--input",
        input,
        "--output",
        output.to_str().unwrap(),
        "--package",
        "notesclient",
        "--port",
        "9000",
        "--no-tidy",
        "--no-format",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Generated 1 routes for module example.com/notes"));

    let server = fs::read_to_string(output.join("server/server.go")).unwrap();
    let client = fs::read_to_string(output.join("notesclient/client.go")).unwrap();
    assert!(server.contains("\":9000\""));
    assert!(server.contains("vertex.Pattern(\"GET\", \"/titles\")"));
    assert!(client.starts_with("// Code generated by vertex. DO NOT EDIT.\n\npackage notesclient\n"));
    assert!(client.contains("const DefaultEndpoint = \"http://localhost:9000\""));
    assert!(dir.path().join("vertex/vertex.go").is_file());
}

#[test]
fn test_config_file_is_honored_and_no_manifest_leaves_go_mod_alone() {
    let dir = project();
    fs::write(dir.path().join("vertex.toml"), "client_package = \"api\"\ntidy = false\nformat = false\n").unwrap();

    let result = vertex(&["--input", dir.path().to_str().unwrap(), "--no-manifest"]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    assert!(dir.path().join("generated/api/client.go").is_file());
    let manifest = fs::read_to_string(dir.path().join("go.mod")).unwrap();
    assert!(!manifest.contains("replace"));
}

#[test]
fn test_failure_exits_with_status_one() {
    let dir = TempDir::new().unwrap();
    let result = vertex(&["--input", dir.path().to_str().unwrap(), "--no-tidy"]);

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("Error:"));
}

#[test]
fn test_invalid_package_name_is_rejected() {
    let dir = project();
    let result = vertex(&["--input", dir.path().to_str().unwrap(), "--package", "not-valid"]);

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("client_package"));
}
