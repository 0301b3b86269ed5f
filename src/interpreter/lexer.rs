use std::rc::Rc;

use logos::Logos;
use num_bigint::BigInt;

use crate::{
    error::DiagnosticBag,
    interpreter::value::Value,
    text::{SourceText, TextSpan},
};

/// The raw token shapes recognized by the scanner, one `logos` rule each.
///
/// Trivia (whitespace, line breaks, comments) is deliberately *not*
/// skipped here: the wrapper below needs the pieces so it can attach them
/// to neighbouring tokens. Unterminated strings and comments get their
/// own lower-priority rules so a best-effort token still comes out of
/// malformed input.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
    /// Integer literal tokens, such as `42`.
    #[regex(r"[0-9]+")]
    Number,
    /// String literal tokens; `""` inside the quotes is an escaped quote.
    #[regex(r#""([^"\r\n]|"")*""#, priority = 6)]
    String,
    /// A string literal cut off by a line break or the end of input.
    #[regex(r#""([^"\r\n]|"")*"#, priority = 5)]
    UnterminatedString,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// Identifier tokens; function names such as `print` or `E`.
    #[regex(r"[A-Za-z]+")]
    Identifier,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `!`
    #[token("!")]
    Bang,
    /// `~`
    #[token("~")]
    Tilde,
    /// `&`
    #[token("&")]
    Ampersand,
    /// `&&`
    #[token("&&")]
    AmpersandAmpersand,
    /// `|`
    #[token("|")]
    Pipe,
    /// `||`
    #[token("||")]
    PipePipe,
    /// `^`
    #[token("^")]
    Caret,
    /// `==`
    #[token("==")]
    EqualsEquals,
    /// `!=`
    #[token("!=")]
    BangEquals,
    /// `<`
    #[token("<")]
    Less,
    /// `<=`
    #[token("<=")]
    LessEquals,
    /// `>`
    #[token(">")]
    Greater,
    /// `>=`
    #[token(">=")]
    GreaterEquals,
    /// `(`
    #[token("(")]
    OpenParen,
    /// `)`
    #[token(")")]
    CloseParen,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `#`
    #[token("#")]
    Hash,
    /// Runs of spaces and tabs.
    #[regex(r"[ \t\f]+")]
    Whitespace,
    /// A single line break.
    #[regex(r"\r\n|\n|\r")]
    LineBreak,
    /// `// comments` running to the end of the line.
    #[regex(r"//[^\n\r]*")]
    SingleLineComment,
    /// `/* comments */`, possibly spanning several lines.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", priority = 6)]
    MultiLineComment,
    /// A multi-line comment cut off by the end of input.
    #[regex(r"/\*([^*]|\*+[^*/])*\**", priority = 5)]
    UnterminatedComment,
}

/// The kinds of tokens handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An integer literal.
    Number,
    /// A string literal.
    String,
    /// The keyword `true`.
    TrueKeyword,
    /// The keyword `false`.
    FalseKeyword,
    /// A function or type name.
    Identifier,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `&`
    Ampersand,
    /// `&&`
    AmpersandAmpersand,
    /// `|`
    Pipe,
    /// `||`
    PipePipe,
    /// `^`
    Caret,
    /// `==`
    EqualsEquals,
    /// `!=`
    BangEquals,
    /// `<`
    Less,
    /// `<=`
    LessEquals,
    /// `>`
    Greater,
    /// `>=`
    GreaterEquals,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `#`
    Hash,
    /// A character the language has no use for.
    Bad,
    /// The zero-width token marking the end of the input.
    EndOfFile,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The kinds of trivia that can ride along with a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    /// Spaces and tabs.
    Whitespace,
    /// A line break.
    LineBreak,
    /// A `//` comment.
    SingleLineComment,
    /// A `/* */` comment.
    MultiLineComment,
    /// Unusable text the parser skipped over.
    SkippedText,
}

/// A piece of source text that carries no meaning of its own but is kept
/// attached to a neighbouring token for faithful position reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTrivia {
    /// What sort of trivia this is.
    pub kind: TriviaKind,
    /// Where it sits in the source.
    pub span: TextSpan,
    /// The raw text.
    pub text: String,
}

/// A lexical token: kind, position, raw text, optional decoded value, and
/// the trivia attached on either side.
///
/// Tokens are immutable once produced. Tokens the parser synthesizes
/// during error recovery are zero-width and carry no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    /// The token's kind.
    pub kind:            TokenKind,
    /// The region of source text the token covers.
    pub span:            TextSpan,
    /// The raw text, exactly as written.
    pub text:            String,
    /// The decoded literal value, when the token carries one.
    pub value:           Option<Value>,
    /// Zero-based physical source line the token starts on.
    pub line:            usize,
    /// Trivia preceding the token.
    pub leading_trivia:  Vec<SyntaxTrivia>,
    /// Trivia following the token, up to and including the line break.
    pub trailing_trivia: Vec<SyntaxTrivia>,
}

impl SyntaxToken {
    /// Creates a zero-width token of the given kind, used by the parser
    /// when it must synthesize a token it expected but did not find.
    #[must_use]
    pub fn synthesized(kind: TokenKind, position: usize, line: usize) -> Self {
        Self { kind,
               span: TextSpan::new(position, 0),
               text: String::new(),
               value: None,
               line,
               leading_trivia: Vec::new(),
               trailing_trivia: Vec::new() }
    }
}

/// Converts program text into tokens plus attached trivia.
pub struct Lexer;

impl Lexer {
    /// Tokenizes the whole input.
    ///
    /// Always produces a final zero-width [`TokenKind::EndOfFile`] token;
    /// trivia with no token after it ends up attached there. Lexical
    /// problems (bad characters, invalid numbers, unterminated strings
    /// and comments) are reported into the returned bag, never fatal.
    #[must_use]
    pub fn tokenize(text: &Rc<SourceText>) -> (Vec<SyntaxToken>, DiagnosticBag) {
        let mut diagnostics = DiagnosticBag::new(Rc::clone(text));

        let mut raw = Vec::new();
        let mut lexer = RawToken::lexer(text.as_str());
        while let Some(result) = lexer.next() {
            let range = lexer.span();
            raw.push((result, TextSpan::from_bounds(range.start, range.end)));
        }

        let mut tokens = Vec::new();
        let mut pending: Vec<SyntaxTrivia> = Vec::new();
        let mut index = 0;

        while index < raw.len() {
            let (result, span) = raw[index].clone();
            index += 1;

            if let Some(trivia) = Self::as_trivia(result, span, text, &mut diagnostics) {
                pending.push(trivia);
                continue;
            }

            let mut token = Self::decode(result, span, text, &mut diagnostics);
            token.leading_trivia = std::mem::take(&mut pending);

            // Trailing trivia runs to the first line break, inclusive;
            // everything after that leads the next token.
            while index < raw.len() {
                let (next, next_span) = raw[index].clone();
                match Self::as_trivia(next, next_span, text, &mut diagnostics) {
                    Some(trivia) => {
                        let is_break = trivia.kind == TriviaKind::LineBreak;
                        token.trailing_trivia.push(trivia);
                        index += 1;
                        if is_break {
                            break;
                        }
                    },
                    None => break,
                }
            }

            tokens.push(token);
        }

        let end = text.len();
        let mut end_of_file =
            SyntaxToken::synthesized(TokenKind::EndOfFile, end, text.line_index(end));
        end_of_file.leading_trivia = pending;
        tokens.push(end_of_file);

        (tokens, diagnostics)
    }

    fn as_trivia(result: Result<RawToken, ()>,
                 span: TextSpan,
                 text: &SourceText,
                 diagnostics: &mut DiagnosticBag)
                 -> Option<SyntaxTrivia> {
        let kind = match result {
            Ok(RawToken::Whitespace) => TriviaKind::Whitespace,
            Ok(RawToken::LineBreak) => TriviaKind::LineBreak,
            Ok(RawToken::SingleLineComment) => TriviaKind::SingleLineComment,
            Ok(RawToken::MultiLineComment) => TriviaKind::MultiLineComment,
            Ok(RawToken::UnterminatedComment) => {
                diagnostics.report_unterminated_multi_line_comment(span);
                TriviaKind::MultiLineComment
            },
            _ => return None,
        };
        Some(SyntaxTrivia { kind,
                            span,
                            text: text.as_str()[span.start..span.end()].to_string() })
    }

    fn decode(result: Result<RawToken, ()>,
              span: TextSpan,
              text: &SourceText,
              diagnostics: &mut DiagnosticBag)
              -> SyntaxToken {
        let slice = &text.as_str()[span.start..span.end()];
        let line = text.line_index(span.start);

        let (kind, value) = match result {
            Ok(RawToken::Number) => {
                let value = BigInt::parse_bytes(slice.as_bytes(), 10);
                if value.is_none() {
                    diagnostics.report_invalid_number(span, slice);
                }
                (TokenKind::Number, value.map(Value::Integer))
            },
            Ok(RawToken::String) => {
                let inner = &slice[1..slice.len() - 1];
                (TokenKind::String, Some(Value::String(inner.replace("\"\"", "\""))))
            },
            Ok(RawToken::UnterminatedString) => {
                diagnostics.report_unterminated_string(span);
                let inner = &slice[1..];
                (TokenKind::String, Some(Value::String(inner.replace("\"\"", "\""))))
            },
            Ok(RawToken::True) => (TokenKind::TrueKeyword, Some(Value::Boolean(true))),
            Ok(RawToken::False) => (TokenKind::FalseKeyword, Some(Value::Boolean(false))),
            Ok(RawToken::Identifier) => (TokenKind::Identifier, None),
            Ok(RawToken::Plus) => (TokenKind::Plus, None),
            Ok(RawToken::Minus) => (TokenKind::Minus, None),
            Ok(RawToken::Star) => (TokenKind::Star, None),
            Ok(RawToken::Slash) => (TokenKind::Slash, None),
            Ok(RawToken::Percent) => (TokenKind::Percent, None),
            Ok(RawToken::Bang) => (TokenKind::Bang, None),
            Ok(RawToken::Tilde) => (TokenKind::Tilde, None),
            Ok(RawToken::Ampersand) => (TokenKind::Ampersand, None),
            Ok(RawToken::AmpersandAmpersand) => (TokenKind::AmpersandAmpersand, None),
            Ok(RawToken::Pipe) => (TokenKind::Pipe, None),
            Ok(RawToken::PipePipe) => (TokenKind::PipePipe, None),
            Ok(RawToken::Caret) => (TokenKind::Caret, None),
            Ok(RawToken::EqualsEquals) => (TokenKind::EqualsEquals, None),
            Ok(RawToken::BangEquals) => (TokenKind::BangEquals, None),
            Ok(RawToken::Less) => (TokenKind::Less, None),
            Ok(RawToken::LessEquals) => (TokenKind::LessEquals, None),
            Ok(RawToken::Greater) => (TokenKind::Greater, None),
            Ok(RawToken::GreaterEquals) => (TokenKind::GreaterEquals, None),
            Ok(RawToken::OpenParen) => (TokenKind::OpenParen, None),
            Ok(RawToken::CloseParen) => (TokenKind::CloseParen, None),
            Ok(RawToken::Comma) => (TokenKind::Comma, None),
            Ok(RawToken::Semicolon) => (TokenKind::Semicolon, None),
            Ok(RawToken::Hash) => (TokenKind::Hash, None),
            Ok(RawToken::Whitespace
               | RawToken::LineBreak
               | RawToken::SingleLineComment
               | RawToken::MultiLineComment
               | RawToken::UnterminatedComment) => {
                unreachable!("trivia reached token decoding")
            },
            Err(()) => {
                for c in slice.chars().take(1) {
                    diagnostics.report_bad_character(span, c);
                }
                (TokenKind::Bad, None)
            },
        };

        SyntaxToken { kind,
                      span,
                      text: slice.to_string(),
                      value,
                      line,
                      leading_trivia: Vec::new(),
                      trailing_trivia: Vec::new() }
    }
}
