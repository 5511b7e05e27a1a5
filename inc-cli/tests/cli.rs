// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("inc").expect("inc binary must be built");
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .expect("inc-cli crate must have a parent workspace directory");
    cmd.current_dir(workspace_root);
    cmd.env_remove("INC_LOG_LEVEL");

    cmd
}

#[test]
fn compile_pair_to_stdout() {
    bin()
        .args(["compile", "demos/pair.scm"])
        .assert()
        .success()
        .stdout(
            "section .text\n\
             global scheme_entry\n\
             scheme_entry:\n\
             mov rsi, rdi\n\
             mov rax, 0x4\n\
             mov [rsi], rax\n\
             mov rax, 0x8\n\
             mov [rsi+4], rax\n\
             mov rax, rsi\n\
             or rax, 1\n\
             add rsi, 8\n\
             mov rax, [rax+3]\n\
             ret\n",
        );
}

#[test]
fn compile_json_reports_metrics() {
    bin()
        .args(["compile", "demos/let-if.scm", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\":true"))
        .stdout(predicate::str::contains("\"labels\":2"))
        .stdout(predicate::str::contains("je L0"));
}

#[test]
fn compile_writes_out_file() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let path = tmp.path().to_str().unwrap().to_string();

    bin()
        .args(["compile", "demos/pair.scm", "--out", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 13 instructions"));

    let asm = std::fs::read_to_string(&path).unwrap();
    assert!(asm.starts_with("section .text\n"));
    assert!(asm.ends_with("ret\n"));
}

#[test]
fn expr_prints_body_only() {
    bin()
        .args(["expr", "(+ 1 2)"])
        .assert()
        .success()
        .stdout("mov rax, 0x8\nmov [rsp-0], rax\nmov rax, 0x4\nadd rax, [rsp-0]\n");
}

#[test]
fn expr_honors_si() {
    bin()
        .args(["expr", "(let ((x 3)) x)", "--si", "4"])
        .assert()
        .success()
        .stdout("mov rax, 0xc\nmov [rsp-4], rax\nmov rax, [rsp-4]\n");
}

#[test]
fn unbound_variable_exits_with_compile_code() {
    bin()
        .args(["compile", "demos/unbound.scm"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unbound variable 'missing'"));
}

#[test]
fn json_errors_go_to_stdout() {
    bin()
        .args(["expr", "(frob 1)", "--json"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"ok\":false"))
        .stdout(predicate::str::contains("\"code\":3"));
}

#[test]
fn oversized_input_is_rejected() {
    bin()
        .args(["compile", "demos/let-if.scm", "--max-bytes", "8"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file too large"));
}

#[test]
fn missing_file_is_io_error() {
    bin()
        .args(["compile", "demos/does-not-exist.scm"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("does-not-exist.scm"));
}
