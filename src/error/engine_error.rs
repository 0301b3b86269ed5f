use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents the fatal errors raised while constructing an executor.
///
/// Unlike front-end diagnostics these are not recoverable: an executor
/// cannot be built over an invalid line collection at all.
pub enum EngineError {
    /// The line collection was empty.
    NoLines,
    /// Two lines in the collection share an identifier.
    DuplicateLine {
        /// The identifier that appeared more than once.
        number: BigInt,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLines => write!(f, "A program requires at least one line."),
            Self::DuplicateLine { number } => {
                write!(f, "The line number {number} appears more than once.")
            },
        }
    }
}

impl std::error::Error for EngineError {}
