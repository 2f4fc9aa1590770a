//! End-to-end tests for the `knot` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const SCHEMA: &str = r#"
[record.Point]
fields = [["x", "int"], ["y", "int"]]

[union.Tree]
constructors = [["Leaf"], ["Node", "Tree", "int", "Tree"]]
"#;

fn knot(args: &[&str], stdin: &str) -> Output {
    knot_with_log(args, stdin, Some("off"))
}

/// Runs `knot` with `RUST_LOG` set to `log`, or unset for `None`.
fn knot_with_log(args: &[&str], stdin: &str, log: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_knot"));
    match log {
        Some(log) => command.env("RUST_LOG", log),
        None => command.env_remove("RUST_LOG"),
    };
    let mut child = command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn knot");
    // The binary may exit (e.g. on an argument error) before reading stdin.
    if let Err(err) = child.stdin.take().unwrap().write_all(stdin.as_bytes()) {
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe, "{err}");
    }
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_schema(dir: &TempDir) -> String {
    let path = dir.path().join("schema.toml");
    std::fs::write(&path, SCHEMA).unwrap();
    path_str(&path)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_fmt_canonicalizes() {
    let output = knot(&["fmt"], "  (\"a\"\n\t(  \"b\"   \"c\" )  ( ) )");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "(\"a\" (\"b\" \"c\") ())\n");
}

#[test]
fn test_fmt_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("value.sexp");
    std::fs::write(&path, "(\"x\"  \"1\")").unwrap();

    let output = knot(&["fmt", &path_str(&path)], "");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "(\"x\" \"1\")\n");
}

#[test]
fn test_fmt_trailing_input() {
    let output = knot(&["fmt"], "(\"a\") x");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "(\"a\")\n");

    let output = knot(&["fmt", "--strict"], "(\"a\") x");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("1:7: trailing input"), "{}", stderr(&output));
}

#[test]
fn test_fmt_rejects_malformed() {
    let output = knot(&["fmt"], "(\"a\"");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unterminated list"), "{}", stderr(&output));

    let output = knot(&["fmt", "--max-depth", "1"], "(())");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("depth limit"), "{}", stderr(&output));
}

#[test]
fn test_fmt_deep_input() {
    let depth = 1_000_000;
    let text = format!("{}{}", "(".repeat(depth), ")".repeat(depth));

    let output = knot(&["fmt"], &text);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), format!("{text}\n"));
}

#[test]
fn test_check_accepts_valid_value() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir);

    let output = knot(
        &["check", "--schema", &schema, "--type", "Tree"],
        "(\"Node\" (\"Leaf\") \"1\" (\"Leaf\"))",
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "(\"Node\" (\"Leaf\") \"1\" (\"Leaf\"))\n");
}

#[test]
fn test_check_prints_canonical_encoding() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir);

    let output = knot(
        &["check", "-s", &schema, "-t", "list<Point>"],
        "((\"y\" \"2\" \"x\" \"1\" \"z\" \"0\"))",
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "((\"x\" \"1\" \"y\" \"2\"))\n");
}

#[test]
fn test_check_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir);

    let output = knot(
        &["check", "--schema", &schema, "--type", "Point"],
        "(\"x\" \"1\")",
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing field y in Point"), "{}", stderr(&output));

    let output = knot(
        &["check", "--schema", &schema, "--type", "Tree"],
        "(\"NotAConstructor\")",
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown constructor"), "{}", stderr(&output));
}

#[test]
fn test_check_accepts_nan() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.toml");
    std::fs::write(&path, "[record.Sample]\nfields = [[\"v\", \"float\"]]\n").unwrap();

    let output = knot(
        &["check", "--schema", &path_str(&path), "--type", "Sample"],
        "(\"v\" \"NaN\")",
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "(\"v\" \"NaN\")\n");
}

#[test]
fn test_check_rejects_unknown_type() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir);

    let output = knot(&["check", "--schema", &schema, "--type", "Forest"], "()");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown type Forest"), "{}", stderr(&output));
}

#[test]
fn test_json_conversion() {
    let output = knot(&["json"], "(\"Node\" (\"Leaf\") \"5\" ())");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "[\"Node\",[\"Leaf\"],\"5\",[]]\n");

    let output = knot(&["json", "--reverse"], "[\"Node\", [\"Leaf\"], \"5\", []]");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "(\"Node\" (\"Leaf\") \"5\" ())\n");
}

#[test]
fn test_json_reverse_rejects_non_strings() {
    let output = knot(&["json", "--reverse"], "[1, 2]");
    assert!(!output.status.success());
}

#[test]
fn test_json_depth_limit() {
    let text = format!("{}{}", "(".repeat(1_000), ")".repeat(1_000));
    let output = knot(&["json"], &text);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("depth limit"), "{}", stderr(&output));
}

#[test]
fn test_log_level_follows_rust_log() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir);
    let args = ["check", "--schema", schema.as_str(), "--type", "Tree"];

    let output = knot_with_log(&args, "(\"Leaf\")", Some("off"));
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stderr(&output), "");

    let output = knot_with_log(&args, "(\"Leaf\")", None);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("loaded schema"), "{}", stderr(&output));
    assert!(stderr(&output).contains("decodes"), "{}", stderr(&output));
}
