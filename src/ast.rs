use crate::{
    interpreter::lexer::{SyntaxToken, TokenKind},
    text::TextSpan,
};

/// An abstract syntax tree (AST) node representing an expression.
///
/// `ExpressionSyntax` covers every expression form in the language, from
/// literals through the count-update forms that are Whenever's only means
/// of control flow. Each variant keeps the tokens it was built from so
/// later stages can point diagnostics at exact source positions.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionSyntax {
    /// A literal value: a number, string, `true` or `false`.
    Literal {
        /// The token carrying the decoded value.
        token: SyntaxToken,
    },
    /// A unary operation, e.g. `-x` or `!x`.
    Unary {
        /// The operator token.
        operator: SyntaxToken,
        /// The operand expression.
        operand:  Box<Self>,
    },
    /// A binary operation, e.g. `a + b`.
    Binary {
        /// Left operand.
        left:     Box<Self>,
        /// The operator token.
        operator: SyntaxToken,
        /// Right operand.
        right:    Box<Self>,
    },
    /// A parenthesized expression.
    Parenthesized {
        /// The `(` token.
        open_paren:  SyntaxToken,
        /// The wrapped expression.
        expression:  Box<Self>,
        /// The `)` token.
        close_paren: SyntaxToken,
    },
    /// A call such as `print("hi")` or `N(3)`.
    Call {
        /// The function (or type) name.
        identifier:  SyntaxToken,
        /// The `(` token.
        open_paren:  SyntaxToken,
        /// The argument expressions, in order.
        arguments:   Vec<Self>,
        /// The `)` token.
        close_paren: SyntaxToken,
    },
    /// A count update, `line # delta`.
    UpdateLineCount {
        /// The expression naming the target line.
        left:  Box<Self>,
        /// The `#` token.
        hash:  SyntaxToken,
        /// The expression producing the delta.
        right: Box<Self>,
    },
    /// A bare count update whose delta is derived from the operand's
    /// sign: `3` adds one to line 3, `-3` removes one.
    UnaryUpdateLineCount {
        /// The expression naming the signed target line.
        operand: Box<Self>,
    },
}

impl ExpressionSyntax {
    /// Creates a parenthesized expression.
    ///
    /// # Panics
    /// Panics unless the tokens are an `(` and a `)`; handing it anything
    /// else is a programming error, not a recoverable diagnostic.
    #[must_use]
    pub fn parenthesized(open_paren: SyntaxToken,
                         expression: Self,
                         close_paren: SyntaxToken)
                         -> Self {
        assert!(open_paren.kind == TokenKind::OpenParen,
                "parenthesized expression requires an open parenthesis token");
        assert!(close_paren.kind == TokenKind::CloseParen,
                "parenthesized expression requires a close parenthesis token");
        Self::Parenthesized { open_paren,
                              expression: Box::new(expression),
                              close_paren }
    }

    /// Gets the source span covered by the expression.
    #[must_use]
    pub fn span(&self) -> TextSpan {
        match self {
            Self::Literal { token } => token.span,
            Self::Unary { operator, operand } => {
                TextSpan::from_bounds(operator.span.start, operand.span().end())
            },
            Self::Binary { left, right, .. } => {
                TextSpan::from_bounds(left.span().start, right.span().end())
            },
            Self::Parenthesized { open_paren, close_paren, .. } => {
                TextSpan::from_bounds(open_paren.span.start, close_paren.span.end())
            },
            Self::Call { identifier, close_paren, .. } => {
                TextSpan::from_bounds(identifier.span.start, close_paren.span.end())
            },
            Self::UpdateLineCount { left, right, .. } => {
                TextSpan::from_bounds(left.span().start, right.span().end())
            },
            Self::UnaryUpdateLineCount { operand } => operand.span(),
        }
    }
}

/// A statement inside a line's body.
///
/// The grammar has exactly one statement form: an expression evaluated
/// for its effect (a call, or one of the count-update expressions).
#[derive(Debug, Clone, PartialEq)]
pub enum StatementSyntax {
    /// An expression evaluated for its effect.
    Expression(ExpressionSyntax),
}

impl StatementSyntax {
    /// Gets the source span covered by the statement.
    #[must_use]
    pub fn span(&self) -> TextSpan {
        match self {
            Self::Expression(expression) => expression.span(),
        }
    }
}

/// One numbered program line: its number literal and the ordered
/// statements sharing that physical source line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStatementSyntax {
    /// The line-number literal.
    pub number:     SyntaxToken,
    /// The statements, in declared order.
    pub statements: Vec<StatementSyntax>,
}

/// The root of the syntax tree: every line statement plus the
/// end-of-file token.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnitSyntax {
    /// The program's lines, in source order.
    pub lines:       Vec<LineStatementSyntax>,
    /// The matched end-of-file token.
    pub end_of_file: SyntaxToken,
}
