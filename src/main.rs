//! The reference CLI harness: reads one file, parses a single expression,
//! prints its Lisp-style AST form, then evaluates it against the default
//! preamble and prints the resulting value. Grounded on
//! `original_source/src/test.cpp`'s `main`.

use std::env;
use std::io::IsTerminal;
use std::process::ExitCode;

use ctl::error::ParseError;
use ctl::error_printer;
use ctl::evaluator::Engine;
use ctl::parser::parse_expression;
use ctl::preamble;
use ctl::source_tracker::Tracker;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} file", args.first().map(String::as_str).unwrap_or("ctl"));
        return ExitCode::FAILURE;
    }

    let mut tracker = Tracker::new();
    let span = match tracker.add_file_checked(&args[1]) {
        Ok(span) => span,
        Err(err) => {
            eprintln!("Unable to open file: {err}");
            return ExitCode::FAILURE;
        }
    };

    let color = std::io::stderr().is_terminal();

    let expr = match parse_expression(&mut tracker, span) {
        Ok(Some(expr)) => expr,
        Ok(None) => {
            error_printer::print_error(&ParseError::new(span, "missing expression"), &tracker, color);
            return ExitCode::FAILURE;
        }
        Err(err) => {
            error_printer::print_error(&err, &tracker, color);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", expr.display(&tracker));

    let mut engine = Engine::new();
    preamble::install(&mut engine);
    match engine.evaluate(&tracker, &expr) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error_printer::print_error(&err, &tracker, color);
            ExitCode::FAILURE
        }
    }
}
