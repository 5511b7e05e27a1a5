// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of the inc project.
// Copyright (C) 2025  The inc authors

//! Reader for the surface syntax.
//!
//! Turns source text into a datum tree ([`Ast`]). This sits
//! in front of the compiler proper, which only ever sees
//! [`Expr`](crate::Expr) values classified from these trees.

use crate::Error;
use std::collections::VecDeque;
use std::fmt;

const MAX_TOKENS: usize = 200_000;
const MAX_PARSE_DEPTH: usize = 1_024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Atom(Atom),
    List(Vec<Ast>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Int(i64),
    Bool(bool),
    Char(char),
    Str(String),
    Sym(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    LParen,
    RParen,
    Int(i64),
    Bool(bool),
    Char(char),
    Str(String),
    Sym(String),
    Eof,
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Atom(Atom::Int(n)) => write!(f, "{n}"),
            Ast::Atom(Atom::Bool(true)) => f.write_str("#t"),
            Ast::Atom(Atom::Bool(false)) => f.write_str("#f"),
            Ast::Atom(Atom::Char(c)) => write!(f, "#\\{c}"),
            Ast::Atom(Atom::Str(s)) => write!(f, "{s:?}"),
            Ast::Atom(Atom::Sym(s)) => f.write_str(s),
            Ast::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Read exactly one datum.
pub fn read(src: &str) -> Result<Ast, Error> {
    let toks = lex(src)?;
    let mut forms = parse(&toks)?;

    match forms.len() {
        0 => Err(Error::Eof),
        1 => Ok(forms.remove(0)),
        _ => Err(Error::Trailing(forms[0].to_string())),
    }
}

/// Read every top-level datum in `src`.
pub fn read_all(src: &str) -> Result<Vec<Ast>, Error> {
    let toks = lex(src)?;
    parse(&toks)
}

// Lexer
pub fn lex(src: &str) -> Result<Vec<Tok>, Error> {
    let mut out = Vec::new();
    let mut it = src.chars().peekable();
    let mut i = 0usize;

    while let Some(&ch) = it.peek() {
        match ch {
            '(' => {
                out.push(Tok::LParen);
                it.next();
                i += 1;
            }
            ')' => {
                out.push(Tok::RParen);
                it.next();
                i += 1;
            }
            ';' => {
                // Line comment; skip until end of line.
                while let Some(&c2) = it.peek() {
                    if c2 == '\n' {
                        break;
                    }

                    it.next();
                    i += 1;
                }
            }
            ' ' | '\n' | '\r' | '\t' => {
                it.next();
                i += 1;
            }
            '#' => {
                let start = i;
                it.next();
                i += 1;

                match it.next() {
                    Some('t') => out.push(Tok::Bool(true)),
                    Some('f') => out.push(Tok::Bool(false)),
                    Some('\\') => {
                        let c = it.next().ok_or(Error::Eof)?;
                        i += 1;
                        out.push(Tok::Char(c));
                    }
                    Some(other) => return Err(Error::Lex(other, i)),
                    None => return Err(Error::Lex(ch, start)),
                }
                i += 1;

                if let Some(&c2) = it.peek() {
                    if !is_delimiter(c2) {
                        return Err(Error::Lex(c2, i));
                    }
                }
            }
            '"' => {
                it.next();
                i += 1;

                let mut s = String::new();
                loop {
                    let c2 = it.next().ok_or(Error::Eof)?;
                    i += 1;

                    match c2 {
                        '"' => break,
                        '\\' => {
                            let e = it.next().ok_or(Error::Eof)?;
                            i += 1;

                            match e {
                                '"' => s.push('"'),
                                '\\' => s.push('\\'),
                                'n' => s.push('\n'),
                                't' => s.push('\t'),
                                other => return Err(Error::Lex(other, i - 1)),
                            }
                        }
                        c => s.push(c),
                    }
                }

                out.push(Tok::Str(s));
            }
            '-' if starts_number(&it) => {
                it.next();
                i += 1;

                let v = lex_digits(&mut it, &mut i, ch)?;
                out.push(Tok::Int(-v));
            }
            '0'..='9' => {
                let v = lex_digits(&mut it, &mut i, ch)?;
                out.push(Tok::Int(v));
            }
            _ => {
                if is_sym_start(ch) {
                    let mut s = String::new();
                    while let Some(&c2) = it.peek() {
                        if is_sym_continue(c2) {
                            s.push(c2);
                            it.next();
                            i += 1;
                        } else {
                            break;
                        }
                    }

                    out.push(Tok::Sym(s));
                } else {
                    return Err(Error::Lex(ch, i));
                }
            }
        }
    }

    if out.len() > MAX_TOKENS {
        return Err(Error::Limit("too many tokens"));
    }

    out.push(Tok::Eof);

    Ok(out)
}

fn lex_digits(
    it: &mut std::iter::Peekable<std::str::Chars<'_>>,
    i: &mut usize,
    first: char,
) -> Result<i64, Error> {
    let start = *i;
    let mut s = String::new();
    while let Some(&c2) = it.peek() {
        if c2.is_ascii_digit() {
            s.push(c2);
            it.next();
            *i += 1;
        } else {
            break;
        }
    }

    s.parse::<i64>().map_err(|_| Error::Lex(first, start))
}

fn starts_number(it: &std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    let mut ahead = it.clone();
    ahead.next();

    matches!(ahead.peek(), Some(c) if c.is_ascii_digit())
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | ';' | ' ' | '\n' | '\r' | '\t')
}

pub fn is_sym_start(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '?' | '!' | '_' | ':')
}

pub fn is_sym_continue(c: char) -> bool {
    is_sym_start(c) || c.is_ascii_digit()
}

// Parser: program := forms*
fn parse(tokens: &[Tok]) -> Result<Vec<Ast>, Error> {
    let mut q: VecDeque<Tok> = tokens.to_vec().into();
    let mut forms = Vec::new();

    while let Some(t) = q.front() {
        match t {
            Tok::Eof => break,
            _ => forms.push(parse_one_limited(&mut q, 0)?),
        }
    }

    Ok(forms)
}

fn parse_one_limited(q: &mut VecDeque<Tok>, depth: usize) -> Result<Ast, Error> {
    if depth > MAX_PARSE_DEPTH {
        return Err(Error::Limit("parse depth exceeded"));
    }

    let t = q.pop_front().ok_or(Error::Eof)?;
    match t {
        Tok::LParen => {
            let mut items = Vec::new();
            loop {
                match q.front() {
                    Some(Tok::RParen) => {
                        q.pop_front();
                        break;
                    }
                    Some(Tok::Eof) | None => return Err(Error::Eof),
                    _ => items.push(parse_one_limited(q, depth + 1)?),
                }
            }

            Ok(Ast::List(items))
        }
        Tok::RParen => Err(Error::Unmatched),
        Tok::Int(v) => Ok(Ast::Atom(Atom::Int(v))),
        Tok::Bool(b) => Ok(Ast::Atom(Atom::Bool(b))),
        Tok::Char(c) => Ok(Ast::Atom(Atom::Char(c))),
        Tok::Str(s) => Ok(Ast::Atom(Atom::Str(s))),
        Tok::Sym(s) => Ok(Ast::Atom(Atom::Sym(s))),
        Tok::Eof => Err(Error::Eof),
    }
}
