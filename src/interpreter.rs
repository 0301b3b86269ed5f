/// The binder module type-checks the syntax tree.
///
/// The binder resolves every operator, call and conversion in the syntax
/// tree against the type lattice, folds constants, and enforces the
/// whole-program rules such as unique line numbers and resolvable line
/// references. Its output is the bound tree the evaluator compiles.
///
/// # Responsibilities
/// - Resolves operators and built-in functions, inserting conversions.
/// - Folds constant expressions, including one-sided logical folding.
/// - Validates line declarations and constant line references.
pub mod binder;
/// The bound module defines the typed program representation.
///
/// Bound nodes mirror the syntax tree with every type resolved and every
/// conversion explicit. The module also defines the resolved operator
/// tables, the conversion classification, and the constant folding
/// helpers shared between the binder and the evaluator.
pub mod bound;
/// The engine module schedules and runs compiled lines.
///
/// The engine holds the line table, draws lines at random weighted by
/// their counts, and provides the running line with the runtime services
/// the built-in functions need: count queries and updates, scheduling
/// flags, randomness, and I/O.
///
/// # Responsibilities
/// - Maintains the count table and the weighted selection over it.
/// - Applies the default count decrement unless a line asks to be kept.
/// - Implements the built-in runtime services for each pass.
pub mod engine;
/// The evaluator module compiles bound lines into schedulable closures.
///
/// The evaluator walks bound statements and expressions, producing one
/// closure per program line. Expression evaluation happens inside those
/// closures, against whichever runtime the engine supplies for the pass.
///
/// # Responsibilities
/// - Evaluates bound expressions, honoring short-circuit operators.
/// - Applies runtime conversions, which can fail on string contents.
/// - Dispatches built-in calls to the engine's runtime services.
pub mod evaluator;
/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads the raw source text and produces a stream of tokens
/// with full trivia attached, so every character of the input is owned by
/// exactly one token. This is the first stage of interpretation.
///
/// # Responsibilities
/// - Converts the input character stream into tokens with source spans.
/// - Decodes numeric and string literals into runtime values.
/// - Reports lexical errors for invalid or malformed input.
pub mod lexer;
/// The parser module builds the abstract syntax tree (AST) from tokens.
///
/// The parser processes the token stream produced by the lexer and
/// constructs an AST of numbered lines and their statements. It recovers
/// from errors by synthesizing expected tokens, so a tree always comes
/// out the other end.
///
/// # Responsibilities
/// - Converts tokens into structured AST nodes (lines, statements,
///   expressions).
/// - Validates the grammar, reporting errors with location info.
/// - Classifies statements into calls and the count-update forms.
pub mod parser;
/// The value module defines the runtime data types for evaluation.
///
/// This module declares the value types used during execution:
/// arbitrary-precision integers, booleans, strings, and the void
/// non-value. It provides typed accessors and display formatting.
pub mod value;
