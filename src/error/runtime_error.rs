use num_bigint::BigInt;

use crate::symbols::TypeSymbol;

#[derive(Debug)]
/// Represents all errors that can occur while a line is executing.
///
/// These arise from values the binder could not see through at compile
/// time, such as an explicit cast applied to a string that does not parse.
pub enum RuntimeError {
    /// An explicit conversion failed for the actual runtime value.
    InvalidCast {
        /// The type of the value as it was at run time.
        from: TypeSymbol,
        /// The type the cast asked for.
        to:   TypeSymbol,
    },
    /// Attempted division (or remainder) by zero.
    DivisionByZero,
    /// `U` was given a value that is not a Unicode scalar.
    InvalidCodePoint {
        /// The offending value.
        value: BigInt,
    },
    /// `random` was given a non-positive upper bound.
    InvalidRandomBound {
        /// The offending bound.
        max: BigInt,
    },
    /// Reading input or writing output failed.
    Io(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCast { from, to } => {
                write!(f, "Cannot convert a value of type '{from}' to '{to}'.")
            },
            Self::DivisionByZero => write!(f, "Division by zero."),
            Self::InvalidCodePoint { value } => {
                write!(f, "The value {value} is not a Unicode scalar.")
            },
            Self::InvalidRandomBound { max } => {
                write!(f, "random() requires a positive bound, but was given {max}.")
            },
            Self::Io(e) => write!(f, "Input/output failed: {e}."),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
