use std::{
    cell::{Cell, RefCell},
    io::{self, Cursor, Write},
    rc::Rc,
};

use num_bigint::BigInt;
use whenever::{
    compile,
    error::{EngineError, RuntimeError},
    interpreter::{
        binder::Binder,
        bound::{BoundExpression, BoundStatement, Conversion},
        engine::{Executor, Line, Runtime},
        lexer::{Lexer, TokenKind},
        parser::Parser,
    },
    symbols::{BuiltinFunction, TypeSymbol},
    text::SourceText,
};

/// An output sink that can still be inspected after the executor has
/// taken ownership of its writing half.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("test output was not UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(source: &str, input: &str) -> String {
    let lines = compile(source).unwrap_or_else(|diagnostics| {
                                   panic!("Program failed to compile:\n{diagnostics:?}")
                               });
    let buffer = SharedBuffer::default();
    let mut executor =
        Executor::with_io(lines, Cursor::new(input.as_bytes().to_vec()), buffer.clone())
            .expect("executor construction failed");
    executor.execute().expect("program raised a runtime error");
    buffer.contents()
}

fn run_error(source: &str) -> RuntimeError {
    let lines = compile(source).expect("program failed to compile");
    let buffer = SharedBuffer::default();
    let mut executor = Executor::with_io(lines, Cursor::new(Vec::new()), buffer)
        .expect("executor construction failed");
    match executor.execute() {
        Ok(()) => panic!("Program succeeded but was expected to fail"),
        Err(e) => e,
    }
}

fn assert_compiles(source: &str) {
    if let Err(diagnostics) = compile(source) {
        panic!("Program failed to compile:\n{diagnostics:?}");
    }
}

fn assert_diagnostic(source: &str, expected: &str) {
    let Err(diagnostics) = compile(source) else {
        panic!("Program compiled but was expected to report: {expected}")
    };
    let messages: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains(expected)),
            "Expected a diagnostic containing {expected:?}, got: {messages:#?}");
}

fn noop_line(number: i32, count: i32) -> Line {
    Line::new(BigInt::from(number),
              BigInt::from(count),
              Rc::new(|_: &mut dyn Runtime| Ok(())))
}

#[test]
fn hello_world() {
    assert_eq!(run(r#"1 print("hello world");"#, ""), "hello world\n");
}

#[test]
fn arithmetic_and_printing() {
    assert_eq!(run("1 print(2 + 3 * 4);", ""), "14\n");
    assert_eq!(run("1 print(7 % 3);", ""), "1\n");
    assert_eq!(run("1 print(10 / 3);", ""), "3\n");
    assert_eq!(run("1 print(-7 / 2);", ""), "-3\n");
    assert_eq!(run("1 print(~5);", ""), "-6\n");
    assert_eq!(run("1 print((1 + 2) * 3);", ""), "9\n");
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(run("1 print(2 < 3);", ""), "true\n");
    assert_eq!(run("1 print(2 >= 3);", ""), "false\n");
    assert_eq!(run("1 print(!true);", ""), "false\n");
    assert_eq!(run("1 print(true && false || true);", ""), "true\n");
    assert_eq!(run("1 print(5 & 3);", ""), "1\n");
    assert_eq!(run("1 print(5 ^ 3);", ""), "6\n");
}

#[test]
fn strings_concatenate_and_compare() {
    assert_eq!(run(r#"1 print("ab" + "cd");"#, ""), "abcd\n");
    assert_eq!(run(r#"1 print("a" + "b" == "ab");"#, ""), "true\n");
    assert_eq!(run(r#"1 print("say ""hi""");"#, ""), "say \"hi\"\n");
}

#[test]
fn explicit_casts() {
    assert_eq!(run(r#"1 print(int("12") + 1);"#, ""), "13\n");
    assert_eq!(run(r#"1 print(string(42) + "!");"#, ""), "42!\n");
    assert_eq!(run(r#"1 print(bool("true") || false);"#, ""), "true\n");
}

#[test]
fn cast_of_unparsable_string_fails_at_runtime() {
    assert!(matches!(run_error(r#"1 print(int("oops"));"#),
                     RuntimeError::InvalidCast { from: TypeSymbol::String,
                                                 to:   TypeSymbol::Integer, }));
    assert!(matches!(run_error(r#"1 print(bool("yes"));"#),
                     RuntimeError::InvalidCast { .. }));
}

#[test]
fn division_by_zero_fails_at_runtime() {
    assert!(matches!(run_error("1 print(1 / 0);"), RuntimeError::DivisionByZero));
    assert!(matches!(run_error("1 print(1 % 0);"), RuntimeError::DivisionByZero));
}

#[test]
fn unicode_builtin() {
    assert_eq!(run("1 print(U(65) + U(66));", ""), "AB\n");
    assert!(matches!(run_error("1 print(U(1114112));"), RuntimeError::InvalidCodePoint { .. }));
    assert!(matches!(run_error("1 print(U(-1));"), RuntimeError::InvalidCodePoint { .. }));
}

#[test]
fn random_builtin() {
    // A bound of one leaves a single possible draw.
    assert_eq!(run("1 print(random(1));", ""), "0\n");
    assert!(matches!(run_error("1 print(random(0));"), RuntimeError::InvalidRandomBound { .. }));
}

#[test]
fn read_returns_input_without_line_break() {
    assert_eq!(run("1 print(read());", "hi\n"), "hi\n");
    assert_eq!(run(r#"1 print(read() + "!");"#, "hi\r\n"), "hi!\n");
}

#[test]
fn statements_on_a_line_run_in_order() {
    assert_eq!(run(r#"1 print(1), print(true), print("s");"#, ""), "1\ntrue\ns\n");
}

#[test]
fn count_updates_schedule_other_lines() {
    // Line 1 grants line 2 two extra runs. Whichever line the scheduler
    // draws first, line 2 ends up running exactly three times.
    let output = run("1 2#2;\n2 print(\"b\");", "");
    assert_eq!(output, "b\nb\nb\n");
}

#[test]
fn count_of_a_missing_line_is_zero() {
    // The argument is not a constant, so the reference cannot be checked
    // at compile time; at run time the unknown line reads as zero.
    assert_eq!(run("1 print(N(random(1) + 2));", ""), "0\n");
}

#[test]
fn exists_reflects_the_running_count() {
    assert_eq!(run("1 print(E(1));", ""), "true\n");
}

#[test]
fn comments_are_ignored() {
    assert_eq!(run("1 /* weight */ print(\"ok\"); // done", ""), "ok\n");
    assert_eq!(run("// leading comment\n1 print(\"ok\");", ""), "ok\n");
}

#[test]
fn again_keeps_the_count_for_one_pass() {
    let lines = compile("1 again(true);").expect("program failed to compile");
    let mut executor = Executor::with_io(lines, Cursor::new(Vec::new()), SharedBuffer::default())
        .expect("executor construction failed");

    assert!(executor.step().expect("step failed"));
    assert_eq!(executor.count(&BigInt::from(1)), Some(&BigInt::from(1)));
}

#[test]
fn a_line_loses_a_count_each_ordinary_pass() {
    let lines = compile("1 again(false);").expect("program failed to compile");
    let mut executor = Executor::with_io(lines, Cursor::new(Vec::new()), SharedBuffer::default())
        .expect("executor construction failed");

    assert!(executor.step().expect("step failed"));
    assert_eq!(executor.count(&BigInt::from(1)), Some(&BigInt::from(0)));
    assert!(!executor.step().expect("step failed"));
}

#[test]
fn line_counts_never_drop_below_zero() {
    let line = noop_line(1, 2);
    assert_eq!(*line.update_count(&BigInt::from(1)).count(), BigInt::from(3));
    assert_eq!(*line.update_count(&BigInt::from(-1)).count(), BigInt::from(1));
    assert_eq!(*line.update_count(&BigInt::from(-5)).count(), BigInt::from(0));

    let exhausted = line.update_count(&BigInt::from(-5));
    assert_eq!(*exhausted.update_count(&BigInt::from(-1)).count(), BigInt::from(0));
}

#[test]
fn executor_rejects_empty_programs() {
    let result = Executor::with_io(Vec::new(), Cursor::new(Vec::new()), SharedBuffer::default());
    assert!(matches!(result, Err(EngineError::NoLines)));
}

#[test]
fn executor_rejects_duplicate_line_numbers() {
    let lines = vec![noop_line(1, 1), noop_line(1, 1)];
    let result = Executor::with_io(lines, Cursor::new(Vec::new()), SharedBuffer::default());
    match result {
        Err(EngineError::DuplicateLine { number }) => assert_eq!(number, BigInt::from(1)),
        other => panic!("Expected a duplicate line error, got {other:?}"),
    }
}

#[test]
fn selection_frequency_follows_the_counts() {
    let first = Rc::new(Cell::new(0_u32));
    let second = Rc::new(Cell::new(0_u32));

    let counting_line = |number: i32, count: i32, counter: &Rc<Cell<u32>>| {
        let counter = Rc::clone(counter);
        Line::new(BigInt::from(number),
                  BigInt::from(count),
                  Rc::new(move |runtime: &mut dyn Runtime| {
                      counter.set(counter.get() + 1);
                      runtime.again(true);
                      Ok(())
                  }))
    };

    let lines = vec![counting_line(1, 2, &first), counting_line(2, 1, &second)];
    let mut executor = Executor::with_io(lines, Cursor::new(Vec::new()), SharedBuffer::default())
        .expect("executor construction failed");

    for _ in 0..3000 {
        assert!(executor.step().expect("step failed"));
    }

    // Line 1 carries two thirds of the weight; with 3000 draws the count
    // is a dozen standard deviations away from these bounds.
    let hits = first.get();
    assert_eq!(hits + second.get(), 3000);
    assert!((1850..=2150).contains(&hits),
            "expected roughly 2000 selections of the heavier line, got {hits}");
}

#[test]
fn defer_must_be_the_last_statement() {
    assert_compiles(r#"1 print("x"), defer(true);"#);
    assert_diagnostic(r#"1 defer(true), print("x");"#,
                      "No statements exist after a call to defer().");
}

#[test]
fn empty_programs_are_rejected() {
    assert_diagnostic("", "No line statements exist.");
    assert_diagnostic("// only a comment\n", "No line statements exist.");
}

#[test]
fn duplicate_line_numbers_are_rejected() {
    assert_diagnostic("1 print(1);\n1 print(2);", "The line number 1 was already used.");
}

#[test]
fn constant_references_to_missing_lines_are_rejected() {
    assert_diagnostic("1 2#1;", "The line number 2 does not exist.");
    assert_diagnostic("1 print(N(7));", "The line number 7 does not exist.");
    assert_diagnostic("1 print(E(7));", "The line number 7 does not exist.");
    assert_diagnostic("1 -3;", "The line number 3 does not exist.");
}

#[test]
fn forward_references_resolve() {
    assert_compiles("1 2#1;\n2 print(2);");
}

#[test]
fn call_diagnostics() {
    assert_diagnostic("1 foo();", "Function 'foo' doesn't exist.");
    assert_diagnostic("1 print();", "Function 'print' requires 1 argument(s) but was given 0.");
    assert_diagnostic("1 again(1);",
                      "Parameter 'keep' requires a value of type 'bool' but was given a value of type 'int'.");
    assert_diagnostic("1 print(1,);", "Unexpected argument syntax.");
}

#[test]
fn operator_diagnostics() {
    assert_diagnostic("1 print(1 + true);",
                      "Binary operator '+' is not defined for types 'int' and 'bool'.");
    assert_diagnostic("1 print(-true);", "Unary operator '-' is not defined for type 'bool'.");
    assert_diagnostic(r##"1 "x"#1;"##,
                      "Update line count operator '#' is not defined for types 'string' and 'int'.");
}

#[test]
fn conversion_diagnostics() {
    assert_diagnostic("1 bool(1);", "Cannot convert type 'int' to 'bool'.");
    assert_diagnostic("1 print(print(1));", "Expression must have a value.");
}

#[test]
fn lexical_diagnostics() {
    assert_diagnostic("1 print(1); @", "Bad character input: '@'.");
    assert_diagnostic("1 = 1;", "Bad character input: '='.");
    assert_diagnostic(r#"1 print("unterminated"#, "Unterminated string literal.");
    assert_diagnostic("1 print(1); /* comment", "Unterminated multi-line comment.");
}

#[test]
fn syntax_diagnostics() {
    assert_diagnostic("1 print(1)", "; expected.");
    assert_diagnostic("1 print(1) print(2);", "; expected.");
    assert_diagnostic("; print(1);", "Unexpected line statement token.");
    assert_diagnostic("1 print(1 + );", "Unexpected token <CloseParen>, expected <Number>.");
}

fn lex_kinds(source: &str) -> Vec<(TokenKind, String)> {
    let text = Rc::new(SourceText::from(source));
    let (tokens, _) = Lexer::tokenize(&text);
    tokens.into_iter()
          .filter(|t| t.kind != TokenKind::EndOfFile)
          .map(|t| (t.kind, t.text))
          .collect()
}

fn fixed_tokens() -> Vec<(TokenKind, &'static str)> {
    vec![(TokenKind::Number, "42"),
         (TokenKind::String, r#""hi""#),
         (TokenKind::TrueKeyword, "true"),
         (TokenKind::FalseKeyword, "false"),
         (TokenKind::Identifier, "print"),
         (TokenKind::Plus, "+"),
         (TokenKind::Minus, "-"),
         (TokenKind::Star, "*"),
         (TokenKind::Slash, "/"),
         (TokenKind::Percent, "%"),
         (TokenKind::Bang, "!"),
         (TokenKind::Tilde, "~"),
         (TokenKind::Ampersand, "&"),
         (TokenKind::AmpersandAmpersand, "&&"),
         (TokenKind::Pipe, "|"),
         (TokenKind::PipePipe, "||"),
         (TokenKind::Caret, "^"),
         (TokenKind::EqualsEquals, "=="),
         (TokenKind::BangEquals, "!="),
         (TokenKind::Less, "<"),
         (TokenKind::LessEquals, "<="),
         (TokenKind::Greater, ">"),
         (TokenKind::GreaterEquals, ">="),
         (TokenKind::OpenParen, "("),
         (TokenKind::CloseParen, ")"),
         (TokenKind::Comma, ","),
         (TokenKind::Semicolon, ";"),
         (TokenKind::Hash, "#")]
}

#[test]
fn single_tokens_lex_back() {
    for (kind, text) in fixed_tokens() {
        let tokens = lex_kinds(text);
        assert_eq!(tokens, vec![(kind, text.to_string())], "lexing {text:?}");
    }
}

#[test]
fn token_pairs_lex_back_when_separated() {
    // Adjacent tokens can merge (`<` `=` is `<=`, two numbers are one);
    // with a separator between them every pair must come back intact.
    for (first_kind, first_text) in fixed_tokens() {
        for (second_kind, second_text) in fixed_tokens() {
            let expected = vec![(first_kind, first_text.to_string()),
                                (second_kind, second_text.to_string())];

            let joined = format!("{first_text}{second_text}");
            if lex_kinds(&joined) == expected {
                continue;
            }

            let separated = format!("{first_text} {second_text}");
            assert_eq!(lex_kinds(&separated),
                       expected,
                       "lexing {separated:?} after {joined:?} merged");
        }
    }
}

#[test]
fn print_argument_binds_as_a_conversion_to_any() {
    let text = Rc::new(SourceText::from(r#"1 print("hi");"#));
    let (unit, diagnostics) = Parser::new(&text).parse_compilation_unit();
    assert!(diagnostics.is_empty(), "parse diagnostics: {diagnostics:?}");

    let (program, diagnostics) = Binder::bind(&text, &unit);
    assert!(diagnostics.is_empty(), "bind diagnostics: {diagnostics:?}");
    assert_eq!(program.lines.len(), 1);

    let BoundStatement::Expression(expression) = &program.lines[0].statements[0];
    let BoundExpression::Call { function, arguments } = expression else {
        panic!("Expected a call, got {expression:?}")
    };
    assert_eq!(*function, BuiltinFunction::Print);
    assert!(matches!(&arguments[0],
                     BoundExpression::Conversion { to: TypeSymbol::Any, expression }
                         if matches!(**expression, BoundExpression::Literal { .. })),
            "Expected a conversion of the literal to any, got {:?}",
            arguments[0]);
}

#[test]
fn constant_expressions_fold_at_bind_time() {
    let text = Rc::new(SourceText::from("1 print(2 + 3);"));
    let (unit, _) = Parser::new(&text).parse_compilation_unit();
    let (program, diagnostics) = Binder::bind(&text, &unit);
    assert!(diagnostics.is_empty(), "bind diagnostics: {diagnostics:?}");

    let BoundStatement::Expression(expression) = &program.lines[0].statements[0];
    let BoundExpression::Call { arguments, .. } = expression else {
        panic!("Expected a call, got {expression:?}")
    };
    let BoundExpression::Conversion { expression: inner, .. } = &arguments[0] else {
        panic!("Expected a conversion, got {:?}", arguments[0])
    };
    assert_eq!(inner.constant_value(),
               Some(&whenever::interpreter::value::Value::Integer(BigInt::from(5))));
}

#[test]
fn self_update_compiles_to_a_single_line() {
    let lines = compile("1 1#3;").expect("program failed to compile");
    assert_eq!(lines.len(), 1);
}

#[test]
fn conversion_classification() {
    assert_eq!(Conversion::classify(TypeSymbol::Boolean, TypeSymbol::Boolean),
               Conversion::Identity);
    assert_eq!(Conversion::classify(TypeSymbol::Integer, TypeSymbol::Any), Conversion::Implicit);
    assert_eq!(Conversion::classify(TypeSymbol::Any, TypeSymbol::Integer), Conversion::Explicit);
    assert_eq!(Conversion::classify(TypeSymbol::Integer, TypeSymbol::String),
               Conversion::Explicit);
    assert_eq!(Conversion::classify(TypeSymbol::String, TypeSymbol::Boolean),
               Conversion::Explicit);
    assert_eq!(Conversion::classify(TypeSymbol::Integer, TypeSymbol::Boolean), Conversion::None);
    assert_eq!(Conversion::classify(TypeSymbol::Void, TypeSymbol::Any), Conversion::None);
}
