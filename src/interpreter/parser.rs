use std::rc::Rc;

use crate::{
    ast::{CompilationUnitSyntax, ExpressionSyntax, LineStatementSyntax, StatementSyntax},
    error::{Diagnostic, DiagnosticBag},
    interpreter::lexer::{Lexer, SyntaxToken, SyntaxTrivia, TokenKind, TriviaKind},
    text::SourceText,
};

/// Recursive-descent, precedence-climbing parser for Whenever programs.
///
/// The parser consumes the whole token stream up front so that bad
/// tokens can be coalesced into skipped-text trivia attached to the next
/// good token, keeping the tree well-formed even over lexical garbage.
///
/// Error recovery follows one invariant throughout: a failed match
/// reports a diagnostic and synthesizes a zero-width token of the
/// expected kind *without consuming input*, and every loop that could
/// stall on such a non-advancing match forces an advance afterwards, so
/// parsing always reaches end-of-file in a bounded number of steps.
pub struct Parser {
    tokens:      Vec<SyntaxToken>,
    position:    usize,
    diagnostics: DiagnosticBag,
}

impl Parser {
    /// Creates a parser over the given source text, running the lexer
    /// and folding every bad token into the following token's leading
    /// trivia.
    #[must_use]
    pub fn new(text: &Rc<SourceText>) -> Self {
        let (raw_tokens, diagnostics) = Lexer::tokenize(text);

        let mut tokens = Vec::with_capacity(raw_tokens.len());
        let mut skipped: Vec<SyntaxTrivia> = Vec::new();
        for mut token in raw_tokens {
            if token.kind == TokenKind::Bad {
                skipped.append(&mut token.leading_trivia);
                skipped.push(SyntaxTrivia { kind: TriviaKind::SkippedText,
                                            span: token.span,
                                            text: token.text });
                skipped.append(&mut token.trailing_trivia);
            } else {
                if !skipped.is_empty() {
                    skipped.append(&mut token.leading_trivia);
                    token.leading_trivia = std::mem::take(&mut skipped);
                }
                tokens.push(token);
            }
        }

        Self { tokens,
               position: 0,
               diagnostics }
    }

    /// Parses the whole program into a compilation unit, returning the
    /// tree along with every lexical and syntactic diagnostic.
    #[must_use]
    pub fn parse_compilation_unit(mut self) -> (CompilationUnitSyntax, Vec<Diagnostic>) {
        let lines = self.parse_line_statements();
        let end_of_file = self.match_token(TokenKind::EndOfFile);
        (CompilationUnitSyntax { lines, end_of_file }, self.diagnostics.into_vec())
    }

    fn current(&self) -> &SyntaxToken {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn next_token(&mut self) -> SyntaxToken {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    /// Consumes the current token when it has the expected kind;
    /// otherwise reports a diagnostic and synthesizes a zero-width token
    /// of that kind without advancing.
    fn match_token(&mut self, kind: TokenKind) -> SyntaxToken {
        if self.current().kind == kind {
            return self.next_token();
        }
        let (span, actual, line) = {
            let current = self.current();
            (current.span, current.kind, current.line)
        };
        self.diagnostics
            .report_unexpected_token(span, &actual.to_string(), &kind.to_string());
        SyntaxToken::synthesized(kind, span.start, line)
    }

    fn parse_line_statements(&mut self) -> Vec<LineStatementSyntax> {
        let mut lines = Vec::new();
        while self.current().kind != TokenKind::EndOfFile {
            if self.current().kind != TokenKind::Number {
                self.diagnostics
                    .report_unexpected_line_statement_token(self.current().span);
                self.next_token();
                continue;
            }
            lines.push(self.parse_line_statement());
        }
        lines
    }

    /// Parses one numbered line.
    ///
    /// Statements are accumulated while the current token remains on the
    /// number's physical source line: a `,` continues the body, a `;`
    /// closes it, and anything else (including a line break) closes it
    /// with a "; expected." diagnostic.
    fn parse_line_statement(&mut self) -> LineStatementSyntax {
        let number = self.match_token(TokenKind::Number);
        let line_index = number.line;

        let mut statements = Vec::new();
        loop {
            let before = self.position;
            statements.push(self.parse_statement());
            if self.position == before {
                // The statement parser only synthesized tokens; force an
                // advance so the line loop cannot stall.
                self.next_token();
            }
            if self.current().kind == TokenKind::Comma && self.current().line == line_index {
                self.next_token();
                continue;
            }
            break;
        }

        if self.current().kind == TokenKind::Semicolon && self.current().line == line_index {
            self.next_token();
        } else {
            self.diagnostics.report_missing_semicolon(self.current().span);
        }

        LineStatementSyntax { number, statements }
    }

    /// Parses one statement of a line body.
    ///
    /// A statement is an expression; `left # right` forms a count
    /// update, a call stands on its own, and any other bare expression
    /// becomes a sign-derived unary count update.
    fn parse_statement(&mut self) -> StatementSyntax {
        let expression = self.parse_expression();

        let expression = if self.current().kind == TokenKind::Hash {
            let hash = self.next_token();
            let right = self.parse_expression();
            ExpressionSyntax::UpdateLineCount { left:  Box::new(expression),
                                                hash,
                                                right: Box::new(right) }
        } else if matches!(expression, ExpressionSyntax::Call { .. }) {
            expression
        } else {
            ExpressionSyntax::UnaryUpdateLineCount { operand: Box::new(expression) }
        };

        StatementSyntax::Expression(expression)
    }

    fn parse_expression(&mut self) -> ExpressionSyntax {
        self.parse_binary_expression(0)
    }

    /// Classic precedence climbing: unary operators bind tighter than
    /// every binary operator, and binary operators combine
    /// left-associatively by rank.
    fn parse_binary_expression(&mut self, parent_precedence: u32) -> ExpressionSyntax {
        let unary_precedence = unary_operator_precedence(self.current().kind);
        let mut left = if unary_precedence != 0 && unary_precedence >= parent_precedence {
            let operator = self.next_token();
            let operand = self.parse_binary_expression(unary_precedence);
            ExpressionSyntax::Unary { operator,
                                      operand: Box::new(operand) }
        } else {
            self.parse_primary_expression()
        };

        loop {
            let precedence = binary_operator_precedence(self.current().kind);
            if precedence == 0 || precedence <= parent_precedence {
                break;
            }
            let operator = self.next_token();
            let right = self.parse_binary_expression(precedence);
            left = ExpressionSyntax::Binary { left:     Box::new(left),
                                              operator,
                                              right:    Box::new(right) };
        }

        left
    }

    fn parse_primary_expression(&mut self) -> ExpressionSyntax {
        match self.current().kind {
            TokenKind::OpenParen => {
                let open_paren = self.next_token();
                let expression = self.parse_expression();
                let close_paren = self.match_token(TokenKind::CloseParen);
                ExpressionSyntax::parenthesized(open_paren, expression, close_paren)
            },
            TokenKind::TrueKeyword | TokenKind::FalseKeyword | TokenKind::String => {
                let token = self.next_token();
                ExpressionSyntax::Literal { token }
            },
            TokenKind::Identifier => self.parse_call_expression(),
            _ => {
                let token = self.match_token(TokenKind::Number);
                ExpressionSyntax::Literal { token }
            },
        }
    }

    fn parse_call_expression(&mut self) -> ExpressionSyntax {
        let identifier = self.next_token();
        let open_paren = self.match_token(TokenKind::OpenParen);
        let arguments = self.parse_arguments();
        let close_paren = self.match_token(TokenKind::CloseParen);
        ExpressionSyntax::Call { identifier,
                                 open_paren,
                                 arguments,
                                 close_paren }
    }

    fn parse_arguments(&mut self) -> Vec<ExpressionSyntax> {
        let mut arguments = Vec::new();
        if self.current().kind == TokenKind::CloseParen
           || self.current().kind == TokenKind::EndOfFile
        {
            return arguments;
        }

        loop {
            arguments.push(self.parse_expression());
            if self.current().kind != TokenKind::Comma {
                break;
            }
            self.next_token();
            if self.current().kind == TokenKind::CloseParen
               || self.current().kind == TokenKind::EndOfFile
            {
                self.diagnostics
                    .report_unexpected_argument_syntax(self.current().span);
                break;
            }
        }

        arguments
    }
}

/// The binding strength of a unary operator token, or `0` when the token
/// is not a unary operator.
#[must_use]
pub const fn unary_operator_precedence(kind: TokenKind) -> u32 {
    match kind {
        TokenKind::Plus | TokenKind::Minus | TokenKind::Bang | TokenKind::Tilde => 6,
        _ => 0,
    }
}

/// The binding strength of a binary operator token, or `0` when the
/// token is not a binary operator.
#[must_use]
pub const fn binary_operator_precedence(kind: TokenKind) -> u32 {
    match kind {
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 5,
        TokenKind::Plus | TokenKind::Minus => 4,
        TokenKind::EqualsEquals
        | TokenKind::BangEquals
        | TokenKind::Less
        | TokenKind::LessEquals
        | TokenKind::Greater
        | TokenKind::GreaterEquals => 3,
        TokenKind::Ampersand | TokenKind::AmpersandAmpersand => 2,
        TokenKind::Pipe | TokenKind::PipePipe | TokenKind::Caret => 1,
        _ => 0,
    }
}
