// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use crate::{CliError, ExprArgs};

use inc_compiler::reader;
use inc_compiler::{Compiler, Env, Expr, Program};
use std::io;

/// Compile one expression body at `si` with an empty
/// environment. No prologue and no `ret`.
pub fn compile_body(src: &str, si: u32) -> Result<Program, CliError> {
    let ast = reader::read(src)?;
    let expr = Expr::from_ast(&ast)?;

    let mut cx = Compiler::new();
    cx.compile_expr(&expr, si, &Env::new())?;

    Ok(cx.finish())
}

pub fn cmd_expr(args: ExprArgs, json: bool) -> Result<(), CliError> {
    let program = compile_body(&args.source, args.si)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "asm": program.to_asm(),
                "metrics": crate::metrics_json(&program.metrics),
            })
        );
    } else {
        program.write_to(io::stdout().lock())?;
    }

    Ok(())
}
