use std::{collections::HashSet, rc::Rc};

use num_bigint::BigInt;
use num_traits::Signed;

use crate::{
    ast::{CompilationUnitSyntax, ExpressionSyntax, LineStatementSyntax, StatementSyntax},
    error::{Diagnostic, DiagnosticBag},
    interpreter::{
        bound::{
            fold_binary, fold_unary, BoundBinaryOperator, BoundExpression, BoundLine,
            BoundProgram, BoundStatement, BoundUnaryOperator, Conversion,
        },
        value::Value,
    },
    symbols::{BuiltinFunction, TypeSymbol},
    text::{SourceText, TextSpan},
};

/// The binder: turns the syntax tree into a typed bound tree.
///
/// Binding resolves every operator and function against the type lattice,
/// inserts conversion nodes, folds constants, and enforces the
/// whole-program rules the parser cannot see, such as duplicate line
/// numbers and references to lines that are never declared. Anything that
/// fails binds to [`BoundExpression::Error`], whose `Error` type
/// suppresses diagnostics about enclosing expressions.
pub struct Binder {
    diagnostics:      DiagnosticBag,
    declared_lines:   HashSet<BigInt>,
    referenced_lines: Vec<(BigInt, TextSpan)>,
}

impl Binder {
    /// Binds a whole compilation unit, returning the bound program along
    /// with every diagnostic raised during binding.
    #[must_use]
    pub fn bind(text: &Rc<SourceText>,
                unit: &CompilationUnitSyntax)
                -> (BoundProgram, Vec<Diagnostic>) {
        let mut binder = Self { diagnostics:      DiagnosticBag::new(Rc::clone(text)),
                                declared_lines:   HashSet::new(),
                                referenced_lines: Vec::new(), };

        if unit.lines.is_empty() {
            binder.diagnostics.report_no_line_statements();
        }

        let mut lines = Vec::with_capacity(unit.lines.len());
        for line in &unit.lines {
            if let Some(bound) = binder.bind_line_statement(line) {
                lines.push(Rc::new(bound));
            }
        }

        // Line references can only be validated once every declaration
        // has been seen; lines may refer forwards as freely as backwards.
        for (number, span) in std::mem::take(&mut binder.referenced_lines) {
            if !binder.declared_lines.contains(&number) {
                binder.diagnostics.report_undefined_line_number(span, &number);
            }
        }

        (BoundProgram { lines }, binder.diagnostics.into_vec())
    }

    fn bind_line_statement(&mut self, line: &LineStatementSyntax) -> Option<BoundLine> {
        let number = match &line.number.value {
            Some(Value::Integer(n)) => Some(n.clone()),
            _ => None,
        };

        let declared = match number {
            Some(ref n) => {
                if self.declared_lines.contains(n) {
                    self.diagnostics
                        .report_line_number_already_used(line.number.span, n);
                    false
                } else {
                    self.declared_lines.insert(n.clone());
                    true
                }
            },
            // The number token was synthesized or failed to decode; the
            // lexer or parser already reported it.
            None => false,
        };

        let statements: Vec<BoundStatement> =
            line.statements.iter().map(|s| self.bind_statement(s)).collect();

        // defer() forfeits the rest of the line, so anything after it is
        // unreachable by construction.
        let last = statements.len().saturating_sub(1);
        for (index, statement) in statements.iter().enumerate() {
            let BoundStatement::Expression(expression) = statement;
            if index < last
               && matches!(expression,
                           BoundExpression::Call { function: BuiltinFunction::Defer, .. })
            {
                self.diagnostics
                    .report_no_statements_after_defer(line.statements[index].span());
            }
        }

        if !declared {
            return None;
        }
        Some(BoundLine { number: number?,
                         statements })
    }

    fn bind_statement(&mut self, statement: &StatementSyntax) -> BoundStatement {
        let StatementSyntax::Expression(expression) = statement;
        BoundStatement::Expression(self.bind_expression(expression))
    }

    fn bind_expression(&mut self, expression: &ExpressionSyntax) -> BoundExpression {
        match expression {
            ExpressionSyntax::Literal { token } => match &token.value {
                Some(value) => BoundExpression::Literal { value: value.clone() },
                // Synthesized during recovery, or the literal failed to
                // decode; either way it was already reported.
                None => BoundExpression::Error,
            },
            ExpressionSyntax::Unary { operator, operand } => {
                let bound_operand = self.bind_expression_value(operand);
                let operand_type = bound_operand.type_symbol();
                if operand_type == TypeSymbol::Error {
                    return BoundExpression::Error;
                }
                let Some(bound_operator) = BoundUnaryOperator::bind(operator.kind, operand_type)
                else {
                    self.diagnostics.report_undefined_unary_operator(operator.span,
                                                                     &operator.text,
                                                                     operand_type);
                    return BoundExpression::Error;
                };
                let constant = fold_unary(bound_operator, &bound_operand);
                BoundExpression::Unary { operator: bound_operator,
                                         operand:  Box::new(bound_operand),
                                         constant }
            },
            ExpressionSyntax::Binary { left, operator, right } => {
                let bound_left = self.bind_expression_value(left);
                let bound_right = self.bind_expression_value(right);
                let (left_type, right_type) =
                    (bound_left.type_symbol(), bound_right.type_symbol());
                if left_type == TypeSymbol::Error || right_type == TypeSymbol::Error {
                    return BoundExpression::Error;
                }
                let Some(bound_operator) =
                    BoundBinaryOperator::bind(operator.kind, left_type, right_type)
                else {
                    self.diagnostics.report_undefined_binary_operator(operator.span,
                                                                      &operator.text,
                                                                      left_type,
                                                                      right_type);
                    return BoundExpression::Error;
                };
                let constant = fold_binary(bound_operator, &bound_left, &bound_right);
                BoundExpression::Binary { operator: bound_operator,
                                          left:     Box::new(bound_left),
                                          right:    Box::new(bound_right),
                                          constant }
            },
            ExpressionSyntax::Parenthesized { expression, .. } => self.bind_expression(expression),
            ExpressionSyntax::Call { .. } => self.bind_call_expression(expression),
            ExpressionSyntax::UpdateLineCount { left, hash, right } => {
                let bound_left = self.bind_expression_value(left);
                let bound_right = self.bind_expression_value(right);
                let (left_type, right_type) =
                    (bound_left.type_symbol(), bound_right.type_symbol());
                if left_type == TypeSymbol::Error || right_type == TypeSymbol::Error {
                    return BoundExpression::Error;
                }
                if left_type != TypeSymbol::Integer || right_type != TypeSymbol::Integer {
                    self.diagnostics.report_undefined_update_operator(hash.span,
                                                                      &hash.text,
                                                                      left_type,
                                                                      right_type);
                    return BoundExpression::Error;
                }
                self.record_line_reference(&bound_left, left.span(), false);
                BoundExpression::UpdateLineCount { left:  Box::new(bound_left),
                                                   right: Box::new(bound_right) }
            },
            ExpressionSyntax::UnaryUpdateLineCount { operand } => {
                let bound_operand = self.bind_expression_value(operand);
                let operand_type = bound_operand.type_symbol();
                if operand_type == TypeSymbol::Error {
                    return BoundExpression::Error;
                }
                if operand_type != TypeSymbol::Integer {
                    self.diagnostics
                        .report_cannot_convert(operand.span(), operand_type, TypeSymbol::Integer);
                    return BoundExpression::Error;
                }
                self.record_line_reference(&bound_operand, operand.span(), true);
                BoundExpression::UnaryUpdateLineCount { operand: Box::new(bound_operand) }
            },
        }
    }

    /// Binds an expression in a context that needs a value, demoting a
    /// `void` expression to an error.
    fn bind_expression_value(&mut self, expression: &ExpressionSyntax) -> BoundExpression {
        let bound = self.bind_expression(expression);
        if bound.type_symbol() == TypeSymbol::Void {
            self.diagnostics.report_expression_must_have_value(expression.span());
            return BoundExpression::Error;
        }
        bound
    }

    fn bind_call_expression(&mut self, expression: &ExpressionSyntax) -> BoundExpression {
        let ExpressionSyntax::Call { identifier, arguments, .. } = expression else {
            unreachable!("bind_call_expression requires a call expression")
        };

        // A single-argument call named after a type is cast syntax,
        // e.g. `int("42")`.
        if arguments.len() == 1 {
            if let Some(to) = TypeSymbol::lookup(&identifier.text) {
                let bound = self.bind_expression_value(&arguments[0]);
                return self.bind_conversion(bound, arguments[0].span(), to, true);
            }
        }

        let Some(function) = BuiltinFunction::lookup(&identifier.text) else {
            self.diagnostics
                .report_undefined_function(identifier.span, &identifier.text);
            return BoundExpression::Error;
        };

        let symbol = function.symbol();
        if arguments.len() != symbol.parameters.len() {
            self.diagnostics.report_wrong_argument_count(expression.span(),
                                                         symbol.name,
                                                         symbol.parameters.len(),
                                                         arguments.len());
            return BoundExpression::Error;
        }

        let mut bound_arguments = Vec::with_capacity(arguments.len());
        for (argument, parameter) in arguments.iter().zip(&symbol.parameters) {
            let bound = self.bind_expression_value(argument);
            let argument_type = bound.type_symbol();
            if argument_type == TypeSymbol::Error {
                return BoundExpression::Error;
            }
            let conversion = Conversion::classify(argument_type, parameter.type_symbol);
            if !conversion.is_implicit() {
                self.diagnostics.report_wrong_argument_type(argument.span(),
                                                            parameter.name,
                                                            parameter.type_symbol,
                                                            argument_type);
                return BoundExpression::Error;
            }
            bound_arguments.push(match conversion {
                                     Conversion::Identity => bound,
                                     _ => BoundExpression::Conversion { to:         parameter.type_symbol,
                                                                        expression: Box::new(bound), },
                                 });
        }

        // E and N name lines; a constant argument is checkable now.
        if matches!(function, BuiltinFunction::Exists | BuiltinFunction::Count) {
            self.record_line_reference(&bound_arguments[0], arguments[0].span(), false);
        }

        BoundExpression::Call { function,
                                arguments: bound_arguments }
    }

    /// Wraps an expression in a conversion to `to`, reporting when no
    /// conversion exists or when only an explicit one does and the
    /// context does not allow it.
    fn bind_conversion(&mut self,
                       expression: BoundExpression,
                       span: TextSpan,
                       to: TypeSymbol,
                       allow_explicit: bool)
                       -> BoundExpression {
        let from = expression.type_symbol();
        if from == TypeSymbol::Error {
            return BoundExpression::Error;
        }
        let conversion = Conversion::classify(from, to);
        if !conversion.exists() {
            self.diagnostics.report_cannot_convert(span, from, to);
            return BoundExpression::Error;
        }
        if conversion == Conversion::Explicit && !allow_explicit {
            self.diagnostics.report_cannot_convert_implicitly(span, from, to);
            return BoundExpression::Error;
        }
        if conversion == Conversion::Identity {
            return expression;
        }
        BoundExpression::Conversion { to,
                                      expression: Box::new(expression) }
    }

    /// Remembers a line number named by a constant expression so it can
    /// be checked against the declared lines once every line is bound.
    /// Non-constant references can only be resolved at run time.
    fn record_line_reference(&mut self, expression: &BoundExpression, span: TextSpan, signed: bool) {
        if let Some(Value::Integer(number)) = expression.constant_value() {
            let number = if signed { number.abs() } else { number.clone() };
            self.referenced_lines.push((number, span));
        }
    }
}
