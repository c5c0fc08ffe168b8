//! Error-tolerant Java lexer.
//!
//! The lexer never fails: unterminated comments and literals extend to the end
//! of the line (literals) or file (block comments) and are reported through
//! [`lex_with_errors`]. Completion runs on half-typed buffers, so every input
//! must produce a token stream that covers the whole text.

use nova_core::{TextRange, TextSize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Whitespace,
    LineComment,
    BlockComment,
    Identifier,
    NumberLiteral,
    StringLiteral,
    TextBlock,
    CharLiteral,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    At,
    DoubleColon,
    Arrow,
    Less,
    Greater,
    Question,
    Colon,
    Eq,
    /// Any other operator (`+`, `&&`, `!=`, ...).
    Op,
    /// A byte that cannot start any token.
    Error,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, SyntaxKind::LineComment | SyntaxKind::BlockComment)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::NumberLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TextBlock
                | SyntaxKind::CharLiteral
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.range]
    }

    pub fn start(&self) -> usize {
        u32::from(self.range.start()) as usize
    }

    pub fn end(&self) -> usize {
        u32::from(self.range.end()) as usize
    }

    pub fn is_ident(&self, src: &str, word: &str) -> bool {
        self.kind == SyntaxKind::Identifier && self.text(src) == word
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {range:?}")]
pub struct LexError {
    pub message: &'static str,
    pub range: TextRange,
}

/// Lex `src` into tokens (including trivia).
pub fn lex(src: &str) -> Vec<Token> {
    lex_with_errors(src).0
}

/// Lex `src`, also returning errors for unterminated comments and literals.
///
/// The range of each error is the range of the offending token.
pub fn lex_with_errors(src: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer {
        input: src.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

fn range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

impl Lexer<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.pos + n).copied()
    }

    fn push(&mut self, kind: SyntaxKind, start: usize) {
        self.tokens.push(Token {
            kind,
            range: range(start, self.pos),
        });
    }

    fn error(&mut self, message: &'static str, start: usize) {
        self.errors.push(LexError {
            message,
            range: range(start, self.pos),
        });
    }

    fn run(&mut self) {
        while let Some(b) = self.peek() {
            let start = self.pos;
            let kind = match b {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0C => {
                    while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0C)) {
                        self.pos += 1;
                    }
                    SyntaxKind::Whitespace
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some_and(|b| b != b'\n' && b != b'\r') {
                        self.pos += 1;
                    }
                    SyntaxKind::LineComment
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                self.error("unterminated block comment", start);
                                break;
                            }
                        }
                    }
                    SyntaxKind::BlockComment
                }
                b'"' if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.lex_text_block(start)
                }
                b'"' => self.lex_quoted(b'"', SyntaxKind::StringLiteral, start),
                b'\'' => self.lex_quoted(b'\'', SyntaxKind::CharLiteral, start),
                b if b.is_ascii_digit() => {
                    self.lex_number();
                    SyntaxKind::NumberLiteral
                }
                b'.' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                    self.lex_number();
                    SyntaxKind::NumberLiteral
                }
                b if is_ident_start(b) => {
                    while self.peek().is_some_and(is_ident_part) {
                        self.pos += 1;
                    }
                    SyntaxKind::Identifier
                }
                _ => self.lex_punct(b),
            };
            self.push(kind, start);
        }
    }

    fn lex_quoted(&mut self, quote: u8, kind: SyntaxKind, start: usize) -> SyntaxKind {
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b) if b == quote => {
                    self.pos += 1;
                    return kind;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if self.peek().is_some_and(|b| b != b'\n' && b != b'\r') {
                        self.pos += 1;
                    }
                }
                Some(b'\n' | b'\r') | None => {
                    self.error("unterminated literal", start);
                    return kind;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn lex_text_block(&mut self, start: usize) -> SyntaxKind {
        self.pos += 3;
        loop {
            match self.peek() {
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.pos += 3;
                    return SyntaxKind::TextBlock;
                }
                Some(b'\\') => self.pos = (self.pos + 2).min(self.input.len()),
                Some(_) => self.pos += 1,
                None => {
                    self.error("unterminated text block", start);
                    return SyntaxKind::TextBlock;
                }
            }
        }
    }

    fn lex_number(&mut self) {
        while let Some(b) = self.peek() {
            let exponent_sign = matches!(b, b'+' | b'-')
                && self.pos > 0
                && matches!(self.input[self.pos - 1], b'e' | b'E' | b'p' | b'P')
                && !self.input_starts_hex_before_exponent();
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// `0x1e+2` is `0x1e` plus `2`; only decimal and hex-float exponents take a sign.
    fn input_starts_hex_before_exponent(&self) -> bool {
        let mut i = self.pos;
        while i > 0 && (self.input[i - 1].is_ascii_alphanumeric() || self.input[i - 1] == b'.') {
            i -= 1;
        }
        let literal = &self.input[i..self.pos];
        let is_hex = literal.len() > 1 && literal[0] == b'0' && matches!(literal[1], b'x' | b'X');
        is_hex && !literal.contains(&b'p') && !literal.contains(&b'P')
    }

    fn lex_punct(&mut self, b: u8) -> SyntaxKind {
        let next = self.peek_at(1);
        let (kind, width) = match (b, next) {
            (b'{', _) => (SyntaxKind::LBrace, 1),
            (b'}', _) => (SyntaxKind::RBrace, 1),
            (b'(', _) => (SyntaxKind::LParen, 1),
            (b')', _) => (SyntaxKind::RParen, 1),
            (b'[', _) => (SyntaxKind::LBracket, 1),
            (b']', _) => (SyntaxKind::RBracket, 1),
            (b';', _) => (SyntaxKind::Semicolon, 1),
            (b',', _) => (SyntaxKind::Comma, 1),
            (b'.', Some(b'.')) if self.peek_at(2) == Some(b'.') => (SyntaxKind::Ellipsis, 3),
            (b'.', _) => (SyntaxKind::Dot, 1),
            (b'@', _) => (SyntaxKind::At, 1),
            (b':', Some(b':')) => (SyntaxKind::DoubleColon, 2),
            (b':', _) => (SyntaxKind::Colon, 1),
            (b'-', Some(b'>')) => (SyntaxKind::Arrow, 2),
            // `>>` stays split so generic closers remain balanced.
            (b'<', Some(b'=' | b'<')) => (SyntaxKind::Op, 2),
            (b'<', _) => (SyntaxKind::Less, 1),
            (b'>', Some(b'=')) => (SyntaxKind::Op, 2),
            (b'>', _) => (SyntaxKind::Greater, 1),
            (b'?', _) => (SyntaxKind::Question, 1),
            (b'=', Some(b'=')) => (SyntaxKind::Op, 2),
            (b'=', _) => (SyntaxKind::Eq, 1),
            (b'!' | b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b'|' | b'&', Some(b'='))
            | (b'+', Some(b'+'))
            | (b'-', Some(b'-'))
            | (b'&', Some(b'&'))
            | (b'|', Some(b'|')) => (SyntaxKind::Op, 2),
            (b'!' | b'~' | b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b'|' | b'&', _) => {
                (SyntaxKind::Op, 1)
            }
            _ => (SyntaxKind::Error, 1),
        };
        self.pos += width;
        kind
    }
}
