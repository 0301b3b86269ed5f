//! # whenever
//!
//! whenever is an interpreter for the Whenever programming language,
//! written in Rust. A Whenever program is a bag of numbered lines with no
//! ordered control flow: each line carries a count, the scheduler runs
//! lines at random weighted by those counts, and the lines steer the
//! program by raising and lowering each other's counts.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use std::rc::Rc;

use crate::{
    error::Diagnostic,
    interpreter::{binder::Binder, engine::Line, evaluator, parser::Parser},
    text::SourceText,
};

/// Defines the structure of parsed code.
///
/// This module declares the syntax types that represent source code as a
/// tree: expressions, statements, numbered lines, and the compilation
/// unit root. The tree is built by the parser and consumed by the binder.
///
/// # Responsibilities
/// - Defines expression and statement types for all language constructs.
/// - Keeps the source tokens inside each node so later stages can point
///   diagnostics at exact positions.
pub mod ast;
/// Provides the error types for every phase.
///
/// This module defines the accumulating front-end diagnostics, the fatal
/// program-construction errors, and the runtime errors a line can raise
/// while executing.
///
/// # Responsibilities
/// - Defines the diagnostic bag with its fixed message formats.
/// - Defines fatal error enums for construction and execution.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together lexing, parsing, binding, evaluation, and
/// the stochastic engine to provide a complete runtime for Whenever
/// programs.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, binder, evaluator,
///   and engine.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// The symbol tables of the language.
///
/// This module defines the closed type lattice and the fixed table of
/// built-in functions with their signatures.
pub mod symbols;
/// Source text bookkeeping.
///
/// This module provides the source text wrapper with line-start indexing
/// and the spans every token and diagnostic uses to name a region of it.
pub mod text;

/// Compiles a Whenever program into schedulable lines.
///
/// The source is lexed, parsed and bound; if any phase reports a
/// diagnostic the whole list is returned and nothing is evaluated.
/// On success, every program line comes back as a compiled [`Line`] with
/// a count of one, ready to hand to an
/// [`Executor`](interpreter::engine::Executor).
///
/// # Errors
/// Every diagnostic the front end reported, in source order per phase.
///
/// # Examples
/// ```
/// // A one-line program compiles to one schedulable line.
/// let lines = whenever::compile(r#"1 print("hello");"#).unwrap();
/// assert_eq!(lines.len(), 1);
///
/// // A reference to a line that does not exist is a diagnostic.
/// assert!(whenever::compile("1 2#1;").is_err());
/// ```
pub fn compile(source: &str) -> Result<Vec<Line>, Vec<Diagnostic>> {
    let text = Rc::new(SourceText::from(source));

    let (unit, mut diagnostics) = Parser::new(&text).parse_compilation_unit();
    let (program, bind_diagnostics) = Binder::bind(&text, &unit);
    diagnostics.extend(bind_diagnostics);

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }
    Ok(evaluator::evaluate(&program))
}
