/// Front-end diagnostics.
///
/// Defines the `Diagnostic` value and the accumulating `DiagnosticBag`
/// every stage reports into. All diagnostics are non-fatal: lexing,
/// parsing and binding keep going with best-effort recovery so one run
/// reports as many independent problems as possible.
pub mod diagnostic;
/// Executor construction errors.
///
/// Contains the fatal errors raised when an execution engine is handed an
/// invalid line collection: an empty program or duplicate line numbers.
pub mod engine_error;
/// Runtime errors.
///
/// Contains all error types that can be raised while a line executes,
/// such as failed explicit conversions, division by zero, invalid Unicode
/// scalars and I/O failures.
pub mod runtime_error;

pub use diagnostic::{Diagnostic, DiagnosticBag};
pub use engine_error::EngineError;
pub use runtime_error::RuntimeError;
