//! End-to-end tests of the driver: L3 text in, L2 text out.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::path::PathBuf;
use std::process::Command;

use pretty_assertions::assert_eq;

use l3c::{compile_file, compile_source, CompileError, CompileOptions};

const MULTI: &str = "
define @main () {
    %x <- call @square(7)
    call print(%x)
    %p <- call allocate(5, 1)
    %s <- call @sum(%p, 2)
    return %s
}

define @square (%n) {
    %r <- %n * %n
    return %r
}

// Adds the first k words of an array.
define @sum (%arr, %k) {
    %acc <- 0
    %i <- 0
    :loop
    %done <- %i >= %k
    br %done :exit
    %off <- %i * 8
    %addr <- %arr + %off
    %addr <- %addr + 8
    %v <- load %addr
    %acc <- %acc + %v
    %i <- %i + 1
    br :loop
    :exit
    return %acc
}
";

fn sequential() -> CompileOptions {
    CompileOptions::default()
}

#[test]
fn constant_return() {
    let l2 = compile_source("define @main () { return 5 }", &sequential()).unwrap();
    assert_eq!(l2, "(@main\n(@main\n\t0\n\trax <- 5\n\treturn\n)\n)\n");
}

#[test]
fn increment_then_decrement() {
    let source = "define @main (%a) {
        %b <- %a + 1
        %c <- %b - 1
        return %c
    }";
    let l2 = compile_source(source, &sequential()).unwrap();
    assert_eq!(
        l2,
        "(@main\n(@main\n\t1\n\t%v0 <- rdi\n\t%v2 <- %v0\n\t%v2++\n\t%v2--\n\trax <- %v2\n\treturn\n)\n)\n"
    );
}

#[test]
fn functions_keep_source_order() {
    let l2 = compile_source(MULTI, &sequential()).unwrap();
    let headers: Vec<&str> = l2.lines().filter(|l| l.starts_with("(@")).collect();
    assert_eq!(headers, vec!["(@main", "(@main", "(@square", "(@sum"]);
    assert!(l2.contains("\tcall @square 1\n"));
    assert!(l2.contains("\tcall print 1\n"));
    assert!(l2.contains("\tcall allocate 2\n"));
    assert!(l2.ends_with(")\n)\n"));
}

#[test]
fn parallel_matches_sequential() {
    let parallel = CompileOptions {
        parallel: true,
        ..CompileOptions::default()
    };
    assert_eq!(
        compile_source(MULTI, &parallel).unwrap(),
        compile_source(MULTI, &sequential()).unwrap()
    );
}

#[test]
fn parse_errors_are_reported() {
    let err = compile_source("define @main () { %x <- }", &sequential()).unwrap_err();
    assert!(matches!(err, CompileError::Source(_)));
}

#[test]
fn compile_file_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.L3");
    let output = dir.path().join("out.L2");
    std::fs::write(&input, MULTI).unwrap();

    let options = CompileOptions {
        parallel: false,
        output: output.clone(),
    };
    compile_file(&input, &options).unwrap();
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        compile_source(MULTI, &sequential()).unwrap()
    );
}

#[test]
fn compile_file_errors_name_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let options = CompileOptions {
        parallel: false,
        output: dir.path().join("out.L2"),
    };

    let missing = dir.path().join("missing.L3");
    let err = compile_file(&missing, &options).unwrap_err();
    assert!(matches!(err, CompileError::Read { .. }));
    assert!(err.to_string().contains("missing.L3"));

    let broken = dir.path().join("broken.L3");
    std::fs::write(&broken, "define @main ( {").unwrap();
    let err = compile_file(&broken, &options).unwrap_err();
    assert!(matches!(err, CompileError::Parse { .. }));
    assert!(err.to_string().contains("broken.L3"));
    assert!(!options.output.exists());
}

fn l3c() -> Command {
    Command::new(PathBuf::from(env!("CARGO_BIN_EXE_l3c")))
}

#[test]
fn binary_compiles_to_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.L3");
    let output = dir.path().join("prog.L2");
    std::fs::write(&input, MULTI).unwrap();

    let status = l3c()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--parallel")
        .status()
        .expect("l3c runs");
    assert!(status.success());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        compile_source(MULTI, &sequential()).unwrap()
    );
}

#[test]
fn binary_defaults_to_prog_l2() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.L3"), "define @main () { return 0 }").unwrap();

    let status = l3c()
        .current_dir(dir.path())
        .arg("a.L3")
        .status()
        .expect("l3c runs");
    assert!(status.success());
    assert!(dir.path().join("prog.L2").exists());
}

#[test]
fn binary_exits_one_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let no_args = l3c().current_dir(dir.path()).output().expect("l3c runs");
    assert_eq!(no_args.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&no_args.stderr).contains("Usage: l3c"));

    std::fs::write(dir.path().join("bad.L3"), "define @main () { return $ }").unwrap();
    let bad = l3c()
        .current_dir(dir.path())
        .arg("bad.L3")
        .output()
        .expect("l3c runs");
    assert_eq!(bad.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&bad.stderr).contains("invalid token `$`"));
}

#[test]
fn binary_help() {
    let out = l3c().arg("--help").output().expect("l3c runs");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("--parallel"));
}
