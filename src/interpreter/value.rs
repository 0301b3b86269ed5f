use std::fmt;

use num_bigint::BigInt;

use crate::symbols::TypeSymbol;

/// A runtime value: the result of evaluating an expression.
///
/// Whenever has exactly three value-bearing types — arbitrary-precision
/// integers, booleans and strings — plus `Void` for calls that produce
/// nothing. The binder guarantees operands reach an operation with the
/// right variant, so accessor mismatches are internal invariant
/// violations rather than user errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An arbitrary-precision integer.
    Integer(BigInt),
    /// A boolean.
    Boolean(bool),
    /// A text string.
    String(String),
    /// The absence of a value, produced by `void`-returning calls.
    Void,
}

impl Value {
    /// The static type this value inhabits.
    #[must_use]
    pub const fn type_symbol(&self) -> TypeSymbol {
        match self {
            Self::Integer(_) => TypeSymbol::Integer,
            Self::Boolean(_) => TypeSymbol::Boolean,
            Self::String(_) => TypeSymbol::String,
            Self::Void => TypeSymbol::Void,
        }
    }

    /// Unwraps an integer value.
    ///
    /// # Panics
    /// Panics if the value is not an integer; the binder rules that out
    /// for well-typed programs, so hitting this is an internal bug.
    #[must_use]
    pub fn into_integer(self) -> BigInt {
        match self {
            Self::Integer(n) => n,
            value => unreachable!("expected an int value, found '{}'", value.type_symbol()),
        }
    }

    /// Unwraps a boolean value.
    ///
    /// # Panics
    /// Panics if the value is not a boolean; see [`Self::into_integer`].
    #[must_use]
    pub fn into_boolean(self) -> bool {
        match self {
            Self::Boolean(b) => b,
            value => unreachable!("expected a bool value, found '{}'", value.type_symbol()),
        }
    }

    /// Unwraps a string value.
    ///
    /// # Panics
    /// Panics if the value is not a string; see [`Self::into_integer`].
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            value => unreachable!("expected a string value, found '{}'", value.type_symbol()),
        }
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Void => Ok(()),
        }
    }
}
