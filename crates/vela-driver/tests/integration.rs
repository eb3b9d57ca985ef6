//! Integration tests for the checker pipeline.
//!
//! These tests write syntax trees to temporary directories and check them
//! through the library and through the `vela` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use vela_driver::{read_program, FileLoader};
use vela_sema::{check_program_with_loader, CheckConfig, DiagnosticKind, DiagnosticSink, Diagnostics};

fn node(line: u32, column: u32, len: u32, value: Value) -> Value {
    json!({ "span": { "line": line, "column": column, "len": len }, "value": value })
}

fn ident(name: &str) -> Value {
    json!({ "value": name })
}

fn int_ptr() -> Value {
    json!({ "value": { "Pointer": { "value": { "Named": "int" } } } })
}

/// `let p: int* = alloc(8);` on line 2
fn alloc_p() -> Value {
    node(
        2,
        3,
        24,
        json!({ "VarDecl": {
            "name": node(2, 7, 1, json!("p")),
            "ty": int_ptr(),
            "init": node(2, 17, 8, json!({ "Alloc": { "value": { "Literal": { "Int": 8 } } } }))
        } }),
    )
}

/// `free(p);` on line 3
fn free_p() -> Value {
    let free = node(3, 3, 7, json!({ "Free": { "value": { "Ident": "p" } } }));
    node(3, 3, 8, json!({ "Expr": free }))
}

fn unit(module_name: &str, source: &str, body: Vec<Value>) -> Value {
    json!({
        "path": "",
        "source": source,
        "modules": [node(1, 1, 6, json!({ "name": ident(module_name), "body": body }))]
    })
}

fn write_unit(dir: &Path, file: &str, unit: &Value) -> PathBuf {
    let path = dir.join(file);
    fs::write(&path, serde_json::to_string_pretty(unit).unwrap()).unwrap();
    path
}

fn leaking_main() -> Value {
    unit("main", "module main {\n  let p: int* = alloc(8);\n}\n", vec![alloc_p()])
}

/// `module geo { pub let origin: int = 0; }`
fn geo() -> Value {
    let origin = node(
        2,
        3,
        26,
        json!({ "VarDecl": {
            "name": node(2, 11, 6, json!("origin")),
            "ty": { "value": { "Named": "int" } },
            "init": node(2, 26, 1, json!({ "Literal": { "Int": 0 } })),
            "is_public": true
        } }),
    );
    unit("geo", "module geo {\n  pub let origin: int = 0;\n}\n", vec![origin])
}

/// `module main { use geo; let x: int = geo::origin; }`
fn main_using_geo() -> Value {
    let use_geo = node(2, 3, 8, json!({ "Use": { "module": node(2, 7, 3, json!("geo")) } }));
    let x = node(
        3,
        3,
        26,
        json!({ "VarDecl": {
            "name": node(3, 7, 1, json!("x")),
            "ty": { "value": { "Named": "int" } },
            "init": node(3, 16, 11, json!({ "ModuleAccess": {
                "module": ident("geo"),
                "name": ident("origin")
            } }))
        } }),
    );
    unit(
        "main",
        "module main {\n  use geo;\n  let x: int = geo::origin;\n}\n",
        vec![use_geo, x],
    )
}

fn vela(args: &[&str], input: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vela"))
        .args(args)
        .arg(input)
        .output()
        .expect("Failed to run vela")
}

#[test]
fn test_imported_module_loaded_from_search_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "geo.json", &geo());
    let main = write_unit(dir.path(), "main.json", &main_using_geo());

    let program = read_program(&main).unwrap();
    let mut loader = FileLoader::new(vec![dir.path().to_path_buf()]);
    let mut sink = Diagnostics::new();
    let passed = check_program_with_loader(&program, &CheckConfig::default(), &mut sink, &mut loader);

    assert!(passed, "unexpected diagnostics: {:?}", sink);
    assert_eq!(loader.loaded_sources().count(), 1);
}

#[test]
fn test_missing_module_is_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_unit(dir.path(), "main.json", &main_using_geo());

    let program = read_program(&main).unwrap();
    let mut loader = FileLoader::new(vec![dir.path().to_path_buf()]);
    let mut sink = Diagnostics::new();
    assert!(!check_program_with_loader(&program, &CheckConfig::default(), &mut sink, &mut loader));
    assert!(!sink.of_kind(DiagnosticKind::UnresolvedModule).is_empty());
    assert_eq!(sink.get(0).unwrap().file_path, program.path);
}

#[test]
fn test_check_passes() {
    let dir = tempfile::tempdir().unwrap();
    let source = "module main {\n  let p: int* = alloc(8);\n  free(p);\n}\n";
    let input = write_unit(dir.path(), "main.json", &unit("main", source, vec![alloc_p(), free_p()]));

    let output = vela(&["check"], &input);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Check passed!"));
}

#[test]
fn test_check_reports_leak() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_unit(dir.path(), "main.json", &leaking_main());

    let output = vela(&["check"], &input);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E0101"), "stderr: {}", stderr);
    assert!(stderr.contains("Memory Leak"), "stderr: {}", stderr);
    assert!(stderr.contains("1 problem(s) found"), "stderr: {}", stderr);
}

#[test]
fn test_no_check_mem_flag() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_unit(dir.path(), "main.json", &leaking_main());

    let output = vela(&["check", "--no-check-mem"], &input);
    assert!(output.status.success());
}

#[test]
fn test_imports_resolved_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "geo.json", &geo());
    let input = write_unit(dir.path(), "main.json", &main_using_geo());

    let output = vela(&["check"], &input);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_module_path_option() {
    let lib_dir = tempfile::tempdir().unwrap();
    let src_dir = tempfile::tempdir().unwrap();
    write_unit(lib_dir.path(), "geo.json", &geo());
    let input = write_unit(src_dir.path(), "main.json", &main_using_geo());

    let output = vela(&["check"], &input);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unresolved Module"));

    let lib = lib_dir.path().to_string_lossy().to_string();
    let output = vela(&["check", "--module-path", &lib], &input);
    assert!(output.status.success());
}

#[test]
fn test_unreadable_input() {
    let dir = tempfile::tempdir().unwrap();
    let output = vela(&["check"], &dir.path().join("missing.json"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}

#[test]
fn test_ast_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_unit(dir.path(), "main.json", &leaking_main());

    let output = vela(&["ast", "--pretty"], &input);
    assert!(output.status.success());
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["modules"][0]["value"]["name"]["value"], "main");
}
