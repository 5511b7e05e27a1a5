// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Command-line interface for the inc compiler.
//!
//! Provides subcommands to compile a source file into
//! assembly, compile a single expression body, and a
//! minimal interactive REPL for experimentation.

#![forbid(unsafe_code)]

mod compile;
mod expr;
mod logging;
mod repl;

use clap::{Parser, Subcommand};
use inc_compiler as compiler;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "inc",
    about = r"# inc

Incremental compiler from a tiny Scheme subset
to x86-64 NASM assembly.",
    version
)]
struct Cli {
    /// Global JSON output
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Global log level (trace|debug|info|warn|error)
    #[arg(
        long,
        global = true,
        env = "INC_LOG_LEVEL",
        default_value = "warn",
        value_parser = ["trace","debug","info","warn","error"],
    )]
    log_level: String,
    /// Max input file size in bytes
    #[arg(long, global = true, default_value_t = 1_048_576)]
    max_bytes: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Compile a program file into an assembly listing
    Compile(CompileArgs),
    /// Compile one expression body (no entry prologue)
    Expr(ExprArgs),
    /// Minimal interactive REPL
    Repl,
}

#[derive(clap::Args, Debug, Clone)]
struct CompileArgs {
    /// Path to the source file
    path: PathBuf,
    /// Write assembly to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
struct ExprArgs {
    /// Expression source, e.g. "(+ 1 2)"
    source: String,
    /// Stack index of the first free slot
    #[arg(long, default_value_t = 0)]
    si: u32,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("compile error: {0}")]
    Compile(#[from] compiler::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("io error: {source}: {path}")]
    IoPath {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
}

impl CliError {
    fn code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) => 2,
            CliError::Compile(_) => 3,
            CliError::Io(_) | CliError::IoPath { .. } => 5,
        }
    }
}

fn try_main(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Compile(args) => compile::cmd_compile(args, cli.json, cli.max_bytes),
        Command::Expr(args) => expr::cmd_expr(args, cli.json),
        Command::Repl => repl::cmd_repl(),
    }
}

fn read_program(path: impl AsRef<std::path::Path>, max_bytes: usize) -> Result<String, CliError> {
    let path_ref = path.as_ref();
    let meta = fs::metadata(path_ref).map_err(|e| CliError::IoPath {
        source: e,
        path: path_ref.to_path_buf(),
    })?;

    if meta.len() as usize > max_bytes {
        return Err(CliError::InvalidInput(format!(
            "file too large: {} bytes (limit {})",
            meta.len(),
            max_bytes
        )));
    }

    let s = fs::read_to_string(path_ref).map_err(|e| CliError::IoPath {
        source: e,
        path: path_ref.to_path_buf(),
    })?;

    Ok(s)
}

fn metrics_json(m: &compiler::CompilerMetrics) -> serde_json::Value {
    serde_json::json!({
        "instrs": m.instrs,
        "labels": m.labels,
        "peak_si": m.peak_si,
        "cons_sites": m.cons_sites,
    })
}

fn main() {
    let cli = Cli::parse();
    logging::init_with_level(Some(&cli.log_level));

    let code = match try_main(cli.clone()) {
        Ok(()) => 0,
        Err(e) => {
            let code = e.code();
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "ok": false, "error": e.to_string(), "code": code })
                );
            } else {
                eprintln!("error: {e}");
            }

            code
        }
    };

    std::process::exit(code);
}
