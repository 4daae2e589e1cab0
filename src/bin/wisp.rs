//! Wisp command-line front-end.
//!
//! Usage:
//!
//! ```text
//! wisp [-v] file.wisp        interpret a file
//! wisp [-v] -e '(+ 1 2)'     evaluate the argument string
//! wisp [-v] -i               interactive read-evaluate-print loop
//! wisp [-v]                  read a program from standard input
//! ```
//!
//! Batch modes print one line per top-level form; `-v` additionally echoes
//! each parsed form before evaluating it.

use std::fs;
use std::io::Read;
use std::rc::Rc;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use wisp::env::Env;
use wisp::parser::Parser;
use wisp::{builtins, evaluator, ErrorKind};

const HISTORY_FILE: &str = ".wisp_history";

struct Options {
    expr: bool,
    interactive: bool,
    verbose: bool,
    args: Vec<String>,
}

fn parse_flags() -> Options {
    let mut opts = Options {
        expr: false,
        interactive: false,
        verbose: false,
        args: Vec::new(),
    };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-e" => opts.expr = true,
            "-i" => opts.interactive = true,
            "-v" => opts.verbose = true,
            _ => opts.args.push(arg),
        }
    }
    opts
}

fn main() -> anyhow::Result<()> {
    let opts = parse_flags();
    let env = Env::root();

    if opts.interactive {
        return run_repl(&env, opts.verbose);
    }

    let source = if opts.expr {
        opts.args.join(" ")
    } else if let Some(path) = opts.args.first() {
        fs::read_to_string(path).with_context(|| format!("failed to open {path}"))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    };

    run_source(&env, &source, opts.verbose);
    Ok(())
}

/// Evaluate a whole source text, printing one line per top-level form.
/// A parse error is printed in place of further output.
fn run_source(env: &Rc<Env>, source: &str, verbose: bool) {
    let mut parser = Parser::new(source);
    loop {
        match parser.parse_one() {
            Ok(form) => {
                if verbose {
                    eprintln!("parsed: {form}");
                }
                println!("{}", evaluator::eval(env, &form));
            }
            Err(ErrorKind::Eof) => return,
            Err(e) => {
                println!("{e}");
                return;
            }
        }
    }
}

fn run_repl(env: &Rc<Env>, verbose: bool) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new().context("could not initialize line editor")?;
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line == ":builtins" {
                    println!("{}", builtins::names().join(" "));
                    continue;
                }

                run_source(env, line, verbose);
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => return Err(err).context("readline failure"),
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
