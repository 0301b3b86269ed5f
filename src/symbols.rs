//! The type lattice and the fixed built-in function table.

use std::fmt;

/// The closed set of types a Whenever expression can have.
///
/// Types are plain values compared with `==`; there is no identity-based
/// registry. `Error` is the type of any ill-typed expression and exists so
/// that a single mistake does not cascade into follow-up diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSymbol {
    /// The dynamic top type; every value converts to it implicitly.
    Any,
    /// `true` or `false`.
    Boolean,
    /// An arbitrary-precision integer.
    Integer,
    /// A text string.
    String,
    /// The type of expressions that produce no value.
    Void,
    /// The type assigned to expressions that failed to bind.
    Error,
}

impl TypeSymbol {
    /// Resolves a type name as it appears in source code.
    ///
    /// A call whose name matches one of these is sugar for an explicit
    /// conversion, e.g. `int("42")`.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "any" => Some(Self::Any),
            "bool" => Some(Self::Boolean),
            "int" => Some(Self::Integer),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Boolean => "bool",
            Self::Integer => "int",
            Self::String => "string",
            Self::Void => "void",
            Self::Error => "?",
        };
        write!(f, "{name}")
    }
}

/// A named, typed parameter of a built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSymbol {
    /// The parameter name used in diagnostics.
    pub name:        &'static str,
    /// The type a matching argument must convert to implicitly.
    pub type_symbol: TypeSymbol,
}

/// The signature of a built-in function: name, ordered parameters and
/// return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    /// The name the function is called by in source code.
    pub name:        &'static str,
    /// The ordered parameter list.
    pub parameters:  Vec<ParameterSymbol>,
    /// The type of the value a call evaluates to.
    pub return_type: TypeSymbol,
}

/// The fixed set of built-in functions.
///
/// Whenever has no user-defined functions; these eight are the whole
/// vocabulary a line can use to inspect and steer the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    /// `again(bool)` — keep the running line's weight this pass.
    Again,
    /// `defer(bool)` — keep the weight and stop the rest of the line.
    Defer,
    /// `E(int)` — whether a line's weight is currently above zero.
    Exists,
    /// `N(int)` — a line's current weight.
    Count,
    /// `print(any)` — write a value to the output.
    Print,
    /// `random(int)` — a uniform value in `[0, max)`.
    Random,
    /// `read()` — read a line of input.
    Read,
    /// `U(int)` — render a Unicode scalar as a one-character string.
    Unicode,
}

impl BuiltinFunction {
    /// Resolves a function by its source-code name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.symbol().name == name)
    }

    /// Every built-in function, in a stable order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Again,
          Self::Defer,
          Self::Exists,
          Self::Count,
          Self::Print,
          Self::Random,
          Self::Read,
          Self::Unicode]
    }

    /// The function's full signature.
    #[must_use]
    pub fn symbol(&self) -> FunctionSymbol {
        let parameter = |name, type_symbol| ParameterSymbol { name, type_symbol };
        match self {
            Self::Again => FunctionSymbol { name:        "again",
                                            parameters:  vec![parameter("keep", TypeSymbol::Boolean)],
                                            return_type: TypeSymbol::Void, },
            Self::Defer => FunctionSymbol { name:        "defer",
                                            parameters:  vec![parameter("defer", TypeSymbol::Boolean)],
                                            return_type: TypeSymbol::Void, },
            Self::Exists => FunctionSymbol { name:        "E",
                                             parameters:  vec![parameter("line", TypeSymbol::Integer)],
                                             return_type: TypeSymbol::Boolean, },
            Self::Count => FunctionSymbol { name:        "N",
                                            parameters:  vec![parameter("line", TypeSymbol::Integer)],
                                            return_type: TypeSymbol::Integer, },
            Self::Print => FunctionSymbol { name:        "print",
                                            parameters:  vec![parameter("value", TypeSymbol::Any)],
                                            return_type: TypeSymbol::Void, },
            Self::Random => FunctionSymbol { name:        "random",
                                             parameters:  vec![parameter("max", TypeSymbol::Integer)],
                                             return_type: TypeSymbol::Integer, },
            Self::Read => FunctionSymbol { name:        "read",
                                           parameters:  Vec::new(),
                                           return_type: TypeSymbol::String, },
            Self::Unicode => FunctionSymbol { name:        "U",
                                              parameters:  vec![parameter("code", TypeSymbol::Integer)],
                                              return_type: TypeSymbol::String, },
        }
    }
}
