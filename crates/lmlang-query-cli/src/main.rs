//! The lmlang-query REPL/CLI binary.
//!
//! Wires CLI flags to `lmlang_query_codegen::compile_and_run`, the same
//! entry point a library caller would use, exactly as the teacher's
//! `lmlang-cli` wires flags to `lmlang_codegen::compile`.

mod catalog;
mod parser;
mod printer;

use std::io::{Read, Write};
use std::process;

use lmlang_query_codegen::{compile_and_run, CodegenError, CompileOptions, Outcome};
use lmlang_query_core::{Catalog, QueryParser, Table, TablePrinter};

use catalog::InMemoryCatalog;
use parser::BuiltinParser;
use printer::TerminalPrinter;

/// Flags accepted on the command line, all optional and long-form (see
/// `SPEC_FULL.md` section 13). Unlike the rest of this workspace's
/// binaries, these are single-dash, multi-character flags (`-opt`,
/// `-no-print`), a grammar `clap`'s builder API has no direct way to
/// express without fighting it -- this crate parses `argv` by hand instead,
/// mirroring the original's own `strcmp`-per-argument loop.
struct Flags {
    optimize: bool,
    no_print: bool,
    no_llvm: bool,
    statement: Option<String>,
}

fn print_usage() {
    println!("lmlang-query options.");
    println!("  -opt              Enable the optimization pipeline.");
    println!("  -no-print         Do not print query results.");
    println!("  -no-llvm          Do not print the built module's LLVM IR.");
    println!("  -s \"stmt\"         Execute \"stmt\" and exit.");
}

/// Parses `argv` (excluding `argv[0]`). Exits the process directly on
/// `--help` (status 0) or an unrecognized flag (status 1), matching the
/// failure semantics in `SPEC_FULL.md` section 10.
fn parse_flags(args: Vec<String>) -> Flags {
    let mut flags = Flags {
        optimize: false,
        no_print: false,
        no_llvm: false,
        statement: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" => {
                print_usage();
                process::exit(0);
            }
            "-opt" => {
                println!("Optimizations enabled.");
                flags.optimize = true;
            }
            "-no-print" => {
                println!("Printing output disabled.");
                flags.no_print = true;
            }
            "-no-llvm" => {
                println!("Printing LLVM IR disabled.");
                flags.no_llvm = true;
            }
            "-s" => match iter.next() {
                Some(stmt) => flags.statement = Some(stmt),
                None => {
                    eprintln!("Error: -s requires a statement argument.");
                    process::exit(1);
                }
            },
            other => {
                eprintln!("Unrecognized command line option \"{other}\".");
                process::exit(1);
            }
        }
    }

    flags
}

/// Reads one statement from `stdin`, byte by byte, matching `ReadQuery`'s
/// multi-line-continuation behavior: a bare `\`-prefixed line (`\q`, `\d`)
/// returns immediately, any other newline is folded into a space and
/// re-prompts, and `;` terminates the statement. EOF is treated as `\q`.
fn read_query<R: Read>(input: &mut R) -> String {
    print!("> ");
    let _ = std::io::stdout().flush();

    let mut buffer = String::new();
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return "\\q".to_string(),
            Ok(_) => {
                let c = byte[0] as char;
                if c == '\n' {
                    if buffer.starts_with('\\') {
                        return buffer;
                    }
                    buffer.push(' ');
                    print!("> ");
                    let _ = std::io::stdout().flush();
                } else if c == ';' {
                    return buffer;
                } else {
                    buffer.push(c);
                }
            }
            Err(_) => return "\\q".to_string(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = parse_flags(args);

    let mut catalog = InMemoryCatalog::new();
    let demo = catalog.load_demo();
    tracing::info!(rows = demo.row_count(), "loaded demo table");
    let printer = TerminalPrinter;
    let query_parser = BuiltinParser::new(demo.columns.iter().map(|c| c.name.clone()).collect());

    if flags.statement.is_none() {
        println!("# lmlang-query v0.1.0");
        println!("# Serving table \"demo\", with no support for multithreading");
        println!("# lmlang-query SQL module loaded");
    }

    let options = CompileOptions {
        optimize: flags.optimize,
        dump_ir: !flags.no_llvm,
        entry_function: "loop",
    };

    let mut stdin = std::io::stdin();
    loop {
        let query_string = match &flags.statement {
            Some(stmt) => stmt.clone(),
            None => read_query(&mut stdin),
        };
        let trimmed = query_string.trim();

        if trimmed == "\\q" || (!trimmed.is_empty() && trimmed.starts_with('^')) {
            break;
        }
        if trimmed == "\\d" {
            for table in catalog.tables() {
                printer.print_table(table);
            }
            if flags.statement.is_some() {
                break;
            }
            continue;
        }

        run_statement(trimmed, &query_parser, &demo, &options, &printer, flags.no_print);

        if flags.statement.is_some() {
            break;
        }
    }
}

/// Parses and runs one statement, printing its result or reporting its
/// error. JIT infrastructure failures (`CodegenError::JitInitFailed`,
/// `CodegenError::SymbolNotFound`) are fatal and abort the process; every
/// other outcome is non-fatal and the REPL continues.
fn run_statement(
    text: &str,
    query_parser: &BuiltinParser,
    table: &Table,
    options: &CompileOptions,
    printer: &TerminalPrinter,
    no_print: bool,
) {
    tracing::debug!(statement = text, "parsing statement");
    let query = match query_parser.parse(text) {
        Ok(None) => return,
        Ok(Some(query)) => query,
        Err(e) => {
            eprintln!("parse error: {e}");
            return;
        }
    };

    if let Err(e) = query.validate() {
        eprintln!("query error: {e}");
        return;
    }

    tracing::debug!(columns = ?query.columns, "compiling and running query");
    match compile_and_run(&query, table, options) {
        Ok(Outcome::Rows(result)) => {
            tracing::debug!(rows = result.row_count(), "query produced rows");
            if !no_print {
                printer.print_table(&result);
            }
        }
        Ok(Outcome::Overflow) => {
            eprintln!("Overflow in calculation!");
        }
        Err(e @ (CodegenError::JitInitFailed(_) | CodegenError::SymbolNotFound(_))) => {
            eprintln!("fatal: {e}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("compile error: {e}");
        }
    }
}
