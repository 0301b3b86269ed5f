use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::{
    error::RuntimeError,
    interpreter::{lexer::TokenKind, value::Value},
    symbols::{BuiltinFunction, TypeSymbol},
};

/// A typed expression produced by the binder.
///
/// The bound tree mirrors the syntax tree with every type resolved,
/// conversions made explicit as their own nodes, and an `Error` variant
/// standing in for anything that failed to bind. Unary and binary nodes
/// carry an eagerly folded constant when their operands allow it.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpression {
    /// A literal value.
    Literal {
        /// The decoded value.
        value: Value,
    },
    /// A unary operation with a resolved operator.
    Unary {
        /// The resolved operator.
        operator: BoundUnaryOperator,
        /// The operand.
        operand:  Box<Self>,
        /// The folded value, when the operand is constant.
        constant: Option<Value>,
    },
    /// A binary operation with a resolved operator.
    Binary {
        /// The resolved operator.
        operator: BoundBinaryOperator,
        /// Left operand.
        left:     Box<Self>,
        /// Right operand.
        right:    Box<Self>,
        /// The folded value, when the operands allow folding.
        constant: Option<Value>,
    },
    /// A call to one of the built-in functions.
    Call {
        /// The resolved function.
        function:  BuiltinFunction,
        /// The bound arguments, already converted to parameter types.
        arguments: Vec<Self>,
    },
    /// A conversion inserted wherever an implicit or explicit conversion
    /// is required.
    Conversion {
        /// The target type.
        to:         TypeSymbol,
        /// The converted expression.
        expression: Box<Self>,
    },
    /// A count update, `line # delta`.
    UpdateLineCount {
        /// The target line number.
        left:  Box<Self>,
        /// The delta.
        right: Box<Self>,
    },
    /// A sign-derived count update.
    UnaryUpdateLineCount {
        /// The signed target line number.
        operand: Box<Self>,
    },
    /// An expression that failed to bind. Its `Error` type suppresses
    /// any further diagnostics about enclosing expressions.
    Error,
}

impl BoundExpression {
    /// The resolved type of the expression.
    #[must_use]
    pub fn type_symbol(&self) -> TypeSymbol {
        match self {
            Self::Literal { value } => value.type_symbol(),
            Self::Unary { operator, .. } => operator.result_type,
            Self::Binary { operator, .. } => operator.result_type,
            Self::Call { function, .. } => function.symbol().return_type,
            Self::Conversion { to, .. } => *to,
            Self::UpdateLineCount { .. } | Self::UnaryUpdateLineCount { .. } => TypeSymbol::Void,
            Self::Error => TypeSymbol::Error,
        }
    }

    /// The expression's folded compile-time value, if it has one.
    #[must_use]
    pub fn constant_value(&self) -> Option<&Value> {
        match self {
            Self::Literal { value } => Some(value),
            Self::Unary { constant, .. } | Self::Binary { constant, .. } => constant.as_ref(),
            _ => None,
        }
    }
}

/// A bound statement: an expression evaluated for its effect.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundStatement {
    /// An expression evaluated for its effect.
    Expression(BoundExpression),
}

/// A fully bound program line: its number and its statements in order.
#[derive(Debug, PartialEq)]
pub struct BoundLine {
    /// The line's identifier.
    pub number:     BigInt,
    /// The statements, in declared order.
    pub statements: Vec<BoundStatement>,
}

/// The bound counterpart of a compilation unit: every line, in source
/// order, ready for the evaluator.
#[derive(Debug, Default)]
pub struct BoundProgram {
    /// The bound lines. Shared so evaluated line closures can keep them
    /// alive without copying statement trees.
    pub lines: Vec<Rc<BoundLine>>,
}

/// The operations a unary operator can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundUnaryOperatorKind {
    /// `+x`
    Identity,
    /// `-x`
    Negation,
    /// `!x`
    LogicalNegation,
    /// `~x`
    OnesComplement,
}

impl BoundUnaryOperatorKind {
    /// Applies the operation to a value.
    ///
    /// # Errors
    /// Never fails today; the `Result` keeps the signature uniform with
    /// binary application, which can fail on division by zero.
    pub fn apply(self, operand: &Value) -> Result<Value, RuntimeError> {
        let value = match self {
            Self::Identity => operand.clone(),
            Self::Negation => Value::Integer(-operand.clone().into_integer()),
            Self::LogicalNegation => Value::Boolean(!operand.clone().into_boolean()),
            // Two's complement: ~x == -x - 1.
            Self::OnesComplement => {
                Value::Integer(-operand.clone().into_integer() - BigInt::one())
            },
        };
        Ok(value)
    }
}

/// A resolved unary operator: its operation plus operand/result types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundUnaryOperator {
    /// The operation.
    pub kind:         BoundUnaryOperatorKind,
    /// The type the operand must have.
    pub operand_type: TypeSymbol,
    /// The type of the result.
    pub result_type:  TypeSymbol,
}

impl BoundUnaryOperator {
    /// Resolves an operator token against an operand type, or `None`
    /// when the operator is not defined for that type.
    #[must_use]
    pub fn bind(token: TokenKind, operand: TypeSymbol) -> Option<Self> {
        let operator = |kind, operand_type, result_type| Self { kind, operand_type, result_type };
        match (token, operand) {
            (TokenKind::Plus, TypeSymbol::Integer) => {
                Some(operator(BoundUnaryOperatorKind::Identity, operand, operand))
            },
            (TokenKind::Minus, TypeSymbol::Integer) => {
                Some(operator(BoundUnaryOperatorKind::Negation, operand, operand))
            },
            (TokenKind::Bang, TypeSymbol::Boolean) => {
                Some(operator(BoundUnaryOperatorKind::LogicalNegation, operand, operand))
            },
            (TokenKind::Tilde, TypeSymbol::Integer) => {
                Some(operator(BoundUnaryOperatorKind::OnesComplement, operand, operand))
            },
            _ => None,
        }
    }
}

/// The operations a binary operator can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundBinaryOperatorKind {
    /// `a + b` on integers.
    Addition,
    /// `a - b`
    Subtraction,
    /// `a * b`
    Multiplication,
    /// `a / b`
    Division,
    /// `a % b`
    Remainder,
    /// `a & b` on integers or booleans.
    BitwiseAnd,
    /// `a | b` on integers or booleans.
    BitwiseOr,
    /// `a ^ b` on integers or booleans.
    BitwiseXor,
    /// `a && b`, short-circuiting.
    LogicalAnd,
    /// `a || b`, short-circuiting.
    LogicalOr,
    /// `a == b`
    Equality,
    /// `a != b`
    Inequality,
    /// `a < b`
    Less,
    /// `a <= b`
    LessOrEqual,
    /// `a > b`
    Greater,
    /// `a >= b`
    GreaterOrEqual,
    /// `a + b` on strings.
    Concatenation,
}

impl BoundBinaryOperatorKind {
    /// Applies the operation to two values.
    ///
    /// # Errors
    /// `RuntimeError::DivisionByZero` when dividing or taking the
    /// remainder by zero.
    pub fn apply(self, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        let integers = |l: &Value, r: &Value| (l.clone().into_integer(), r.clone().into_integer());
        let value = match self {
            Self::Addition => {
                let (l, r) = integers(left, right);
                Value::Integer(l + r)
            },
            Self::Subtraction => {
                let (l, r) = integers(left, right);
                Value::Integer(l - r)
            },
            Self::Multiplication => {
                let (l, r) = integers(left, right);
                Value::Integer(l * r)
            },
            Self::Division => {
                let (l, r) = integers(left, right);
                if r.is_zero() {
                    return Err(RuntimeError::DivisionByZero);
                }
                Value::Integer(l / r)
            },
            Self::Remainder => {
                let (l, r) = integers(left, right);
                if r.is_zero() {
                    return Err(RuntimeError::DivisionByZero);
                }
                Value::Integer(l % r)
            },
            Self::BitwiseAnd => match (left, right) {
                (Value::Boolean(l), Value::Boolean(r)) => Value::Boolean(l & r),
                _ => {
                    let (l, r) = integers(left, right);
                    Value::Integer(l & r)
                },
            },
            Self::BitwiseOr => match (left, right) {
                (Value::Boolean(l), Value::Boolean(r)) => Value::Boolean(l | r),
                _ => {
                    let (l, r) = integers(left, right);
                    Value::Integer(l | r)
                },
            },
            Self::BitwiseXor => match (left, right) {
                (Value::Boolean(l), Value::Boolean(r)) => Value::Boolean(l ^ r),
                _ => {
                    let (l, r) = integers(left, right);
                    Value::Integer(l ^ r)
                },
            },
            Self::LogicalAnd => {
                Value::Boolean(left.clone().into_boolean() && right.clone().into_boolean())
            },
            Self::LogicalOr => {
                Value::Boolean(left.clone().into_boolean() || right.clone().into_boolean())
            },
            Self::Equality => Value::Boolean(left == right),
            Self::Inequality => Value::Boolean(left != right),
            Self::Less => {
                let (l, r) = integers(left, right);
                Value::Boolean(l < r)
            },
            Self::LessOrEqual => {
                let (l, r) = integers(left, right);
                Value::Boolean(l <= r)
            },
            Self::Greater => {
                let (l, r) = integers(left, right);
                Value::Boolean(l > r)
            },
            Self::GreaterOrEqual => {
                let (l, r) = integers(left, right);
                Value::Boolean(l >= r)
            },
            Self::Concatenation => {
                let mut l = left.clone().into_string();
                l.push_str(&right.clone().into_string());
                Value::String(l)
            },
        };
        Ok(value)
    }
}

/// A resolved binary operator: its operation plus operand/result types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundBinaryOperator {
    /// The operation.
    pub kind:        BoundBinaryOperatorKind,
    /// The type the left operand must have.
    pub left_type:   TypeSymbol,
    /// The type the right operand must have.
    pub right_type:  TypeSymbol,
    /// The type of the result.
    pub result_type: TypeSymbol,
}

impl BoundBinaryOperator {
    /// Resolves an operator token against its operand types, or `None`
    /// when the operator is not defined for that pair.
    #[must_use]
    pub fn bind(token: TokenKind, left: TypeSymbol, right: TypeSymbol) -> Option<Self> {
        use BoundBinaryOperatorKind as Kind;
        use TypeSymbol::{Boolean, Integer, String};

        let operator = |kind, result_type| Self { kind,
                                                  left_type: left,
                                                  right_type: right,
                                                  result_type };

        if left != right {
            return None;
        }
        let kind = match (token, left) {
            (TokenKind::Plus, Integer) => Kind::Addition,
            (TokenKind::Minus, Integer) => Kind::Subtraction,
            (TokenKind::Star, Integer) => Kind::Multiplication,
            (TokenKind::Slash, Integer) => Kind::Division,
            (TokenKind::Percent, Integer) => Kind::Remainder,
            (TokenKind::Ampersand, Integer | Boolean) => Kind::BitwiseAnd,
            (TokenKind::Pipe, Integer | Boolean) => Kind::BitwiseOr,
            (TokenKind::Caret, Integer | Boolean) => Kind::BitwiseXor,
            (TokenKind::AmpersandAmpersand, Boolean) => Kind::LogicalAnd,
            (TokenKind::PipePipe, Boolean) => Kind::LogicalOr,
            (TokenKind::EqualsEquals, Integer | Boolean | String) => Kind::Equality,
            (TokenKind::BangEquals, Integer | Boolean | String) => Kind::Inequality,
            (TokenKind::Less, Integer) => Kind::Less,
            (TokenKind::LessEquals, Integer) => Kind::LessOrEqual,
            (TokenKind::Greater, Integer) => Kind::Greater,
            (TokenKind::GreaterEquals, Integer) => Kind::GreaterOrEqual,
            (TokenKind::Plus, String) => Kind::Concatenation,
            _ => return None,
        };

        let result_type = match kind {
            Kind::LogicalAnd
            | Kind::LogicalOr
            | Kind::Equality
            | Kind::Inequality
            | Kind::Less
            | Kind::LessOrEqual
            | Kind::Greater
            | Kind::GreaterOrEqual => Boolean,
            _ => left,
        };
        Some(operator(kind, result_type))
    }
}

/// The result of classifying a conversion between two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// No conversion exists.
    None,
    /// The types are equal; nothing to do.
    Identity,
    /// The conversion is inserted silently, e.g. anything into `any`.
    Implicit,
    /// The conversion exists but must be spelled out as a cast call.
    Explicit,
}

impl Conversion {
    /// Classifies the conversion from one type to another.
    #[must_use]
    pub fn classify(from: TypeSymbol, to: TypeSymbol) -> Self {
        use TypeSymbol::{Any, Boolean, Integer, String, Void};

        if from == to {
            return Self::Identity;
        }
        if from != Void && to == Any {
            return Self::Implicit;
        }
        if from == Any && to != Void {
            return Self::Explicit;
        }
        match (from, to) {
            (Integer | Boolean, String) | (String, Integer | Boolean) => Self::Explicit,
            _ => Self::None,
        }
    }

    /// Whether any conversion exists at all.
    #[must_use]
    pub const fn exists(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether the conversion may be inserted without a cast.
    #[must_use]
    pub const fn is_implicit(&self) -> bool {
        matches!(self, Self::Identity | Self::Implicit)
    }
}

/// Folds a unary operation over a constant operand, if there is one.
#[must_use]
pub fn fold_unary(operator: BoundUnaryOperator, operand: &BoundExpression) -> Option<Value> {
    let value = operand.constant_value()?;
    operator.kind.apply(value).ok()
}

/// Folds a binary operation when its operands allow it.
///
/// Logical AND and OR fold from one known side: a constant `false`
/// decides a conjunction and a constant `true` decides a disjunction,
/// whatever the other side turns out to be at run time.
#[must_use]
pub fn fold_binary(operator: BoundBinaryOperator,
                   left: &BoundExpression,
                   right: &BoundExpression)
                   -> Option<Value> {
    let left = left.constant_value();
    let right = right.constant_value();

    match operator.kind {
        BoundBinaryOperatorKind::LogicalAnd => {
            if left == Some(&Value::Boolean(false)) || right == Some(&Value::Boolean(false)) {
                return Some(Value::Boolean(false));
            }
            operator.kind.apply(left?, right?).ok()
        },
        BoundBinaryOperatorKind::LogicalOr => {
            if left == Some(&Value::Boolean(true)) || right == Some(&Value::Boolean(true)) {
                return Some(Value::Boolean(true));
            }
            operator.kind.apply(left?, right?).ok()
        },
        _ => operator.kind.apply(left?, right?).ok(),
    }
}
