// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use inc_compiler as compiler;

use crate::CliError;

const REPL_MAX_BYTES: usize = 64 * 1024;

const HELP: &str = r"Commands:
  :help              - this help
  :quit, :q          - exit
  :metrics           - metrics of the last compiled datum
  EXPR               - compile EXPR as a program and print its asm";

#[derive(Debug, PartialEq, Eq)]
enum Reply {
    NeedMore,
    Output(String),
    Quit,
}

// Live session state
#[derive(Default)]
struct Session {
    acc: String,
    last_metrics: Option<compiler::CompilerMetrics>,
}

impl Session {
    /// Feed one input line. Lines accumulate until parens balance.
    fn handle_input(&mut self, line: &str) -> Reply {
        self.acc.push_str(line);
        self.acc.push('\n');

        if self.acc.len() > REPL_MAX_BYTES {
            self.acc.clear();
            return Reply::Output(format!(
                "error: input too large (>{REPL_MAX_BYTES} bytes); buffer cleared"
            ));
        }

        if paren_balance(&self.acc) > 0 {
            return Reply::NeedMore;
        }

        let input = std::mem::take(&mut self.acc);
        let s = input.trim();

        match s {
            "" => Reply::Output(String::new()),
            ":quit" | ":q" => Reply::Quit,
            ":help" => Reply::Output(HELP.to_string()),
            ":metrics" => Reply::Output(match &self.last_metrics {
                Some(m) => format!(
                    "instrs={} labels={} peak_si={} cons_sites={}",
                    m.instrs, m.labels, m.peak_si, m.cons_sites
                ),
                None => "no program compiled yet".to_string(),
            }),
            cmd if cmd.starts_with(':') => {
                Reply::Output(format!("error: unknown command '{cmd}' (try :help)"))
            }
            src => match compiler::compile_str(src) {
                Ok(p) => {
                    let asm = p.to_asm();
                    self.last_metrics = Some(p.metrics);

                    Reply::Output(asm.trim_end().to_string())
                }
                Err(e) => Reply::Output(format!("error: {e}")),
            },
        }
    }

    fn clear(&mut self) {
        self.acc.clear();
    }
}

pub fn cmd_repl() -> Result<(), CliError> {
    println!("inc REPL\n\n  Type :help for help. Ctrl-D to exit.");

    let mut session = Session::default();
    let mut rl =
        DefaultEditor::new().map_err(|e| CliError::InvalidInput(format!("repl init: {e}")))?;

    // History path: $HOME/.inc_history (fallback: ./.inc_history)
    let hist_path = std::env::var("HOME")
        .map(|h| format!("{h}/.inc_history"))
        .unwrap_or_else(|_| ".inc_history".into());
    let _ = rl.load_history(&hist_path);

    let mut need_more = false;

    loop {
        let prompt = if need_more { ".. " } else { "> " };
        let line = match rl.readline(prompt) {
            Ok(s) => s,
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C: drop the pending buffer
                session.clear();
                need_more = false;
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("error: io: {e}");
                continue;
            }
        };

        match session.handle_input(&line) {
            Reply::NeedMore => {
                need_more = true;
                continue;
            }
            Reply::Quit => break,
            Reply::Output(out) => {
                need_more = false;
                let _ = rl.add_history_entry(line.as_str());

                if !out.is_empty() {
                    println!("{out}");
                }
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

/// Net open parens outside strings, chars and comments.
fn paren_balance(s: &str) -> i32 {
    let mut bal = 0i32;
    let mut in_str = false;
    let mut esc = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if in_str {
            if esc {
                esc = false;
            } else if c == '\\' {
                esc = true;
            } else if c == '"' {
                in_str = false;
            }

            continue;
        }

        match c {
            '"' => in_str = true,
            ';' => {
                for n in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
            }
            '#' if chars.peek() == Some(&'\\') => {
                chars.next();
                chars.next();
            }
            '(' => bal += 1,
            ')' => bal -= 1,
            _ => {}
        }
    }

    bal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_input_waits_for_balance() {
        let mut s = Session::default();

        assert_eq!(s.handle_input("(let ((x 1))"), Reply::NeedMore);
        match s.handle_input("  x)") {
            Reply::Output(asm) => {
                assert!(asm.starts_with("section .text"));
                assert!(asm.ends_with("ret"));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn metrics_follow_last_program() {
        let mut s = Session::default();
        assert_eq!(
            s.handle_input(":metrics"),
            Reply::Output("no program compiled yet".into())
        );

        let _ = s.handle_input("(cons 1 2)");
        match s.handle_input(":metrics") {
            Reply::Output(m) => assert!(m.contains("cons_sites=1")),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn errors_are_reported_not_fatal() {
        let mut s = Session::default();

        match s.handle_input("(frob 1)") {
            Reply::Output(m) => assert!(m.starts_with("error: compile: unknown primitive")),
            other => panic!("unexpected reply {other:?}"),
        }
        assert!(matches!(s.handle_input("#t"), Reply::Output(_)));
    }

    #[test]
    fn quit_and_unknown_commands() {
        let mut s = Session::default();
        assert!(matches!(s.handle_input(":bogus"), Reply::Output(m) if m.contains("unknown command")));
        assert_eq!(s.handle_input(":q"), Reply::Quit);
    }

    #[test]
    fn balance_ignores_parens_in_strings_and_chars() {
        assert_eq!(paren_balance("(\"(\" #\\( ; (\n"), 1);
        assert_eq!(paren_balance("(a (b))"), 0);
    }
}
