//! Java tokenizer
//!
//! Produces significant tokens only (whitespace and comments are dropped)
//! together with the positions of every line separator. Lexical errors do
//! not stop tokenization; they are returned next to the tokens so the
//! parser can still build an outline.

use crate::logging::{codes, Code};
use crate::utils::{Position, Span};
use std::iter::Peekable;
use std::str::CharIndices;

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while",
];

const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

// Longest first so that maximal munch works by prefix test
const OPERATORS: &[&str] = &[
    ">>>=", "<<=", "...", "->", "::", "==", "<=", ">=", "!=", "&&", "||", "++", "--", "+=", "-=",
    "*=", "/=", "&=", "|=", "^=", "%=", "<<", "(", ")", "{", "}", "[", "]", ";", ",", ".", "@",
    "=", ">", "<", "!", "~", "?", ":", "+", "-", "*", "/", "&", "|", "^", "%",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Literal,
    Operator,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Operator | TokenKind::Keyword) && self.text == text
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Identifier or primitive type keyword
    pub fn is_type_start(&self) -> bool {
        self.is_identifier()
            || (self.kind == TokenKind::Keyword && PRIMITIVE_TYPES.contains(&self.text.as_str()))
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Lexical errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("Invalid character '{character}'")]
    InvalidCharacter { character: char, span: Span },

    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("Unterminated comment")]
    UnterminatedComment { span: Span },
}

impl LexerError {
    pub fn error_code(&self) -> Code {
        codes::front_end::SYNTAX_ERROR
    }

    pub fn span(&self) -> Span {
        match self {
            Self::InvalidCharacter { span, .. }
            | Self::UnterminatedString { span }
            | Self::UnterminatedChar { span }
            | Self::UnterminatedComment { span } => *span,
        }
    }
}

/// Output of a tokenizer run
#[derive(Debug, Clone, Default)]
pub struct LexedSource {
    /// Always terminated by an `Eof` token
    pub tokens: Vec<Token>,
    pub line_separators: Vec<usize>,
    pub errors: Vec<LexerError>,
}

pub fn tokenize(source: &str) -> LexedSource {
    JavaLexer::new(source).run()
}

/// Tokenize a slice of a larger source, keeping absolute positions
pub fn tokenize_from(source: &str, start: Position, end_offset: usize) -> LexedSource {
    let end = end_offset.min(source.len());
    let mut lexer = JavaLexer::new(&source[..end]);
    lexer.skip_to(start);
    lexer.run()
}

struct JavaLexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: Position,
    out: LexedSource,
}

impl<'a> JavaLexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pos: Position::start(),
            out: LexedSource::default(),
        }
    }

    fn skip_to(&mut self, start: Position) {
        while let Some(&(offset, _)) = self.chars.peek() {
            if offset >= start.offset {
                break;
            }
            self.chars.next();
        }
        self.pos = start;
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        match ch {
            '\n' => {
                self.out.line_separators.push(self.pos.offset);
                self.pos = self.pos.advance('\n');
            }
            '\r' => {
                if self.peek() != Some('\n') {
                    self.out.line_separators.push(self.pos.offset);
                    self.pos = Position::new(self.pos.offset + 1, self.pos.line + 1, 1);
                } else {
                    self.pos = Position::new(self.pos.offset + 1, self.pos.line, self.pos.column);
                }
            }
            c => self.pos = self.pos.advance(c),
        }
        Some(ch)
    }

    fn push(&mut self, kind: TokenKind, start: Position) {
        let text = self.source[start.offset..self.pos.offset].to_string();
        self.out.tokens.push(Token {
            kind,
            text,
            span: Span::new(start, self.pos),
        });
    }

    fn run(mut self) -> LexedSource {
        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if self.peek_second() == Some('*') => self.block_comment(start),
                '"' => self.string_literal(start),
                '\'' => self.char_literal(start),
                c if c.is_ascii_digit() => self.number(start),
                '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => self.number(start),
                c if c.is_alphabetic() || c == '_' || c == '$' => self.word(start),
                _ => self.operator(start, ch),
            }
        }

        let eof = self.pos;
        self.out.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::new(eof, eof),
        });
        self.out
    }

    fn block_comment(&mut self, start: Position) {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return;
                }
                Some(_) => {}
                None => {
                    self.out.errors.push(LexerError::UnterminatedComment {
                        span: Span::new(start, self.pos),
                    });
                    return;
                }
            }
        }
    }

    fn string_literal(&mut self, start: Position) {
        if self.source[start.offset..].starts_with("\"\"\"") {
            return self.text_block(start);
        }

        self.bump();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    self.push(TokenKind::Literal, start);
                    return;
                }
                Some('\\') => {
                    self.bump();
                    if !matches!(self.peek(), Some('\n') | Some('\r') | None) {
                        self.bump();
                    }
                }
                Some('\n') | Some('\r') | None => {
                    self.out.errors.push(LexerError::UnterminatedString {
                        span: Span::new(start, self.pos),
                    });
                    self.push(TokenKind::Literal, start);
                    return;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn text_block(&mut self, start: Position) {
        for _ in 0..3 {
            self.bump();
        }
        loop {
            if self.source[self.pos.offset..].starts_with("\"\"\"") {
                for _ in 0..3 {
                    self.bump();
                }
                self.push(TokenKind::Literal, start);
                return;
            }
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(_) => {}
                None => {
                    self.out.errors.push(LexerError::UnterminatedString {
                        span: Span::new(start, self.pos),
                    });
                    self.push(TokenKind::Literal, start);
                    return;
                }
            }
        }
    }

    fn char_literal(&mut self, start: Position) {
        self.bump();
        loop {
            match self.peek() {
                Some('\'') => {
                    self.bump();
                    self.push(TokenKind::Literal, start);
                    return;
                }
                Some('\\') => {
                    self.bump();
                    if !matches!(self.peek(), Some('\n') | Some('\r') | None) {
                        self.bump();
                    }
                }
                Some('\n') | Some('\r') | None => {
                    self.out.errors.push(LexerError::UnterminatedChar {
                        span: Span::new(start, self.pos),
                    });
                    self.push(TokenKind::Literal, start);
                    return;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn number(&mut self, start: Position) {
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && matches!(prev, 'e' | 'E' | 'p' | 'P');
            let hex = self.source[start.offset..].starts_with("0x")
                || self.source[start.offset..].starts_with("0X");
            // In hex literals 'e' is a digit, so only 'p' introduces an exponent
            let exponent_sign = exponent_sign && (!hex || matches!(prev, 'p' | 'P'));
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                if c == '.' && self.peek_second() == Some('.') {
                    break;
                }
                prev = c;
                self.bump();
            } else {
                break;
            }
        }
        self.push(TokenKind::Literal, start);
    }

    fn word(&mut self, start: Position) {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start.offset..self.pos.offset];
        let kind = if matches!(text, "true" | "false" | "null") {
            TokenKind::Literal
        } else if KEYWORDS.contains(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, start);
    }

    fn operator(&mut self, start: Position, ch: char) {
        let rest = &self.source[start.offset..];
        // '>' is always split so nested type arguments close one at a time
        let matched = if rest.starts_with(">=") {
            Some(">=")
        } else if ch == '>' {
            Some(">")
        } else {
            OPERATORS.iter().copied().find(|op| rest.starts_with(op))
        };

        match matched {
            Some(op) => {
                for _ in 0..op.chars().count() {
                    self.bump();
                }
                self.push(TokenKind::Operator, start);
            }
            None => {
                self.bump();
                self.out.errors.push(LexerError::InvalidCharacter {
                    character: ch,
                    span: Span::new(start, self.pos),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .tokens
            .into_iter()
            .filter(|t| !t.is_eof())
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            texts("package p; public class C extends B {}"),
            vec!["package", "p", ";", "public", "class", "C", "extends", "B", "{", "}"]
        );
    }

    #[test]
    fn test_comments_and_literals() {
        let lexed = tokenize("/* doc */ String s = \"a // b\"; // tail\nchar c = '\\'';");
        assert!(lexed.errors.is_empty());
        let literals: Vec<_> = lexed
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Literal)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(literals, vec!["\"a // b\"", "'\\''"]);
        assert_eq!(lexed.line_separators.len(), 1);
    }

    #[test]
    fn test_generic_closers_are_split() {
        assert_eq!(
            texts("Map<String, List<Integer>> m;"),
            vec!["Map", "<", "String", ",", "List", "<", "Integer", ">", ">", "m", ";"]
        );
        assert_eq!(texts("a >= b"), vec!["a", ">=", "b"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            texts("x = 0x1F + 1_000L + 1.5e-3 + .5f;"),
            vec!["x", "=", "0x1F", "+", "1_000L", "+", "1.5e-3", "+", ".5f", ";"]
        );
    }

    #[test]
    fn test_line_separators_and_positions() {
        let lexed = tokenize("a\r\nb\nc");
        assert_eq!(lexed.line_separators, vec![2, 4]);
        let c = &lexed.tokens[2];
        assert_eq!(c.span.start.line, 3);
        assert_eq!(c.span.start.column, 1);
    }

    #[test]
    fn test_errors_do_not_stop_tokenization() {
        let lexed = tokenize("int a = #; String s = \"open\nint b;");
        assert_eq!(lexed.errors.len(), 2);
        assert!(matches!(lexed.errors[0], LexerError::InvalidCharacter { character: '#', .. }));
        assert!(lexed.tokens.iter().any(|t| t.text == "b"));
    }

    #[test]
    fn test_tokenize_from_keeps_absolute_positions() {
        let source = "class A { void m() { call(); } }";
        let start = source.find("{ call").unwrap();
        let end = source.rfind('}').unwrap();
        let lexed = tokenize_from(source, Position::new(start, 1, start as u32 + 1), end);
        assert_eq!(lexed.tokens[0].text, "{");
        assert_eq!(lexed.tokens[0].span.start.offset, start);
        assert_eq!(lexed.tokens[1].text, "call");
    }
}
