// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use crate::{CliError, CompileArgs};

use inc_compiler as compiler;
use std::fs;
use std::io;

pub fn cmd_compile(args: CompileArgs, json: bool, max_bytes: usize) -> Result<(), CliError> {
    let t_start = std::time::Instant::now();
    let src = crate::read_program(&args.path, max_bytes)?;

    let program = compiler::compile_str(&src)?;
    let elapsed_ms = t_start.elapsed().as_millis();

    if let Some(out) = &args.out {
        let file = fs::File::create(out).map_err(|e| CliError::IoPath {
            source: e,
            path: out.clone(),
        })?;

        program
            .write_to(io::BufWriter::new(file))
            .map_err(|e| CliError::IoPath {
                source: e,
                path: out.clone(),
            })?;

        tracing::info!(
            target = "cli.compile",
            path = %out.display(),
            instrs = program.metrics.instrs,
            "asm written"
        );
    }

    if json {
        let mut body = serde_json::json!({
            "ok": true,
            "time_ms": elapsed_ms,
            "metrics": crate::metrics_json(&program.metrics),
        });

        match &args.out {
            Some(out) => body["out"] = serde_json::json!(out.display().to_string()),
            None => body["asm"] = serde_json::json!(program.to_asm()),
        }

        println!("{body}");
    } else if args.out.is_none() {
        program.write_to(io::stdout().lock())?;
    } else {
        let m = &program.metrics;
        println!(
            "Wrote {} instructions ({} labels, peak si {}) in {elapsed_ms} ms",
            m.instrs, m.labels, m.peak_si
        );
    }

    Ok(())
}
