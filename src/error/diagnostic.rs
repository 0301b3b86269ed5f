use std::rc::Rc;

use num_bigint::BigInt;

use crate::{symbols::TypeSymbol, text::SourceText, text::TextSpan};

/// A single front-end diagnostic: a source location plus a message.
///
/// Diagnostics are never fatal. Whole-program diagnostics that have no
/// single source point (such as a missing line number discovered after
/// every line was bound to no avail) carry the default, empty location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The region of source text the diagnostic refers to.
    pub span:    TextSpan,
    /// One-based source line, or `0` for whole-program diagnostics.
    pub line:    usize,
    /// One-based source column, or `0` for whole-program diagnostics.
    pub column:  usize,
    /// The formatted message.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "({}, {}): {}", self.line, self.column, self.message)
        }
    }
}

/// An accumulating sink for diagnostics.
///
/// Each pipeline stage owns one bag, reports into it with the fixed
/// message formats below, and keeps going with best-effort recovery so a
/// single run surfaces as many independent problems as possible.
#[derive(Debug)]
pub struct DiagnosticBag {
    text:        Rc<SourceText>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Creates an empty bag reporting positions against `text`.
    #[must_use]
    pub fn new(text: Rc<SourceText>) -> Self {
        Self { text,
               diagnostics: Vec::new() }
    }

    /// Whether any diagnostic has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Consumes the bag, yielding the reported diagnostics in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Moves every diagnostic out of `other` into this bag.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
    }

    fn report(&mut self, span: TextSpan, message: String) {
        let (line, column) = self.text.line_column(span.start);
        self.diagnostics.push(Diagnostic { span, line, column, message });
    }

    fn report_whole_program(&mut self, message: String) {
        self.diagnostics.push(Diagnostic { span:   TextSpan::default(),
                                           line:   0,
                                           column: 0,
                                           message });
    }

    pub fn report_invalid_number(&mut self, span: TextSpan, text: &str) {
        self.report(span, format!("The number '{text}' isn't valid."));
    }

    pub fn report_unterminated_string(&mut self, span: TextSpan) {
        self.report(span, "Unterminated string literal.".to_string());
    }

    pub fn report_unterminated_multi_line_comment(&mut self, span: TextSpan) {
        self.report(span, "Unterminated multi-line comment.".to_string());
    }

    pub fn report_bad_character(&mut self, span: TextSpan, c: char) {
        self.report(span, format!("Bad character input: '{c}'."));
    }

    pub fn report_unexpected_token(&mut self, span: TextSpan, actual: &str, expected: &str) {
        self.report(span, format!("Unexpected token <{actual}>, expected <{expected}>."));
    }

    pub fn report_expression_must_have_value(&mut self, span: TextSpan) {
        self.report(span, "Expression must have a value.".to_string());
    }

    pub fn report_missing_semicolon(&mut self, span: TextSpan) {
        self.report(span, "; expected.".to_string());
    }

    pub fn report_undefined_unary_operator(&mut self, span: TextSpan, operator: &str, operand: TypeSymbol) {
        self.report(span,
                    format!("Unary operator '{operator}' is not defined for type '{operand}'."));
    }

    pub fn report_undefined_binary_operator(&mut self,
                                            span: TextSpan,
                                            operator: &str,
                                            left: TypeSymbol,
                                            right: TypeSymbol) {
        self.report(span,
                    format!("Binary operator '{operator}' is not defined for types '{left}' and '{right}'."));
    }

    pub fn report_no_line_statements(&mut self) {
        self.report_whole_program("No line statements exist.".to_string());
    }

    pub fn report_undefined_update_operator(&mut self,
                                            span: TextSpan,
                                            operator: &str,
                                            left: TypeSymbol,
                                            right: TypeSymbol) {
        self.report(span,
                    format!("Update line count operator '{operator}' is not defined for types '{left}' and '{right}'."));
    }

    pub fn report_wrong_argument_count(&mut self, span: TextSpan, name: &str, expected: usize, actual: usize) {
        self.report(span,
                    format!("Function '{name}' requires {expected} argument(s) but was given {actual}."));
    }

    pub fn report_undefined_function(&mut self, span: TextSpan, name: &str) {
        self.report(span, format!("Function '{name}' doesn't exist."));
    }

    pub fn report_undefined_line_number(&mut self, span: TextSpan, number: &BigInt) {
        self.report(span, format!("The line number {number} does not exist."));
    }

    pub fn report_wrong_argument_type(&mut self,
                                      span: TextSpan,
                                      name: &str,
                                      expected: TypeSymbol,
                                      actual: TypeSymbol) {
        self.report(span,
                    format!("Parameter '{name}' requires a value of type '{expected}' but was given a value of type '{actual}'."));
    }

    pub fn report_cannot_convert(&mut self, span: TextSpan, from: TypeSymbol, to: TypeSymbol) {
        self.report(span, format!("Cannot convert type '{from}' to '{to}'."));
    }

    pub fn report_cannot_convert_implicitly(&mut self, span: TextSpan, from: TypeSymbol, to: TypeSymbol) {
        self.report(span,
                    format!("Cannot convert type '{from}' to '{to}'. An explicit conversion exists (are you missing a cast?)"));
    }

    pub fn report_unexpected_argument_syntax(&mut self, span: TextSpan) {
        self.report(span, "Unexpected argument syntax.".to_string());
    }

    pub fn report_unexpected_line_statement_token(&mut self, span: TextSpan) {
        self.report(span, "Unexpected line statement token.".to_string());
    }

    pub fn report_no_statements_after_defer(&mut self, span: TextSpan) {
        self.report(span, "No statements exist after a call to defer().".to_string());
    }

    pub fn report_line_number_already_used(&mut self, span: TextSpan, number: &BigInt) {
        self.report(span, format!("The line number {number} was already used."));
    }
}
