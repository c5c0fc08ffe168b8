//! Token access and identifier scanning over a source buffer.

use std::ops::Range;

use nova_core::{TextRange, TextSize};
use nova_syntax::{lex, SyntaxKind, Token};

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Clamp `offset` into `text`, moving back to a char boundary.
pub(crate) fn clamp_offset(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Start of the identifier that ends at `offset`.
pub(crate) fn ident_start(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let mut start = offset;
    while start > 0 && is_ident_byte(bytes[start - 1]) {
        start -= 1;
    }
    start
}

/// Start of the dotted name (`java.ut`) that ends at `offset`.
pub(crate) fn dotted_start(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let mut start = offset;
    while start > 0 && (is_ident_byte(bytes[start - 1]) || bytes[start - 1] == b'.') {
        start -= 1;
    }
    while start < offset && bytes[start] == b'.' {
        start += 1;
    }
    start
}

pub(crate) fn text_range(range: Range<usize>) -> TextRange {
    TextRange::new(
        TextSize::from(range.start as u32),
        TextSize::from(range.end as u32),
    )
}

/// A buffer together with its non-trivia tokens.
pub(crate) struct Source<'a> {
    pub text: &'a str,
    pub tokens: Vec<Token>,
    /// Comment and literal tokens, kept to detect cursors inside them.
    opaque: Vec<Token>,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut opaque = Vec::new();
        for token in lex(text) {
            if token.kind.is_comment() || token.kind.is_literal() {
                opaque.push(token);
            }
            if !token.kind.is_trivia() {
                tokens.push(token);
            }
        }
        Self {
            text,
            tokens,
            opaque,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn kind(&self, idx: usize) -> Option<SyntaxKind> {
        self.tokens.get(idx).map(|t| t.kind)
    }

    pub fn is(&self, idx: usize, kind: SyntaxKind) -> bool {
        self.kind(idx) == Some(kind)
    }

    pub fn text_of(&self, idx: usize) -> &'a str {
        self.tokens
            .get(idx)
            .map(|t| &self.text[t.start()..t.end()])
            .unwrap_or("")
    }

    /// Identifier text at `idx`, if the token is an identifier.
    pub fn word(&self, idx: usize) -> Option<&'a str> {
        self.is(idx, SyntaxKind::Identifier).then(|| self.text_of(idx))
    }

    pub fn is_word(&self, idx: usize, word: &str) -> bool {
        self.word(idx) == Some(word)
    }

    /// Number of tokens that end at or before `offset`.
    pub fn tokens_before(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.end() <= offset)
    }

    /// Index of the token containing `offset` (end inclusive for identifiers).
    pub fn token_at(&self, offset: usize) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.start() <= offset && offset < t.end())
            .or_else(|| {
                self.tokens
                    .iter()
                    .position(|t| t.kind == SyntaxKind::Identifier && t.end() == offset)
            })
    }

    /// Source text spanning tokens `lo..hi`.
    pub fn span_text(&self, lo: usize, hi: usize) -> &'a str {
        match (self.tokens.get(lo), hi.checked_sub(1).and_then(|h| self.tokens.get(h))) {
            (Some(first), Some(last)) if lo < hi => &self.text[first.start()..last.end()],
            _ => "",
        }
    }

    /// Index of the bracket closing the one opened at `open`.
    pub fn matching_close(&self, open: usize, limit: usize) -> Option<usize> {
        let (lhs, rhs) = match self.kind(open)? {
            SyntaxKind::LParen => (SyntaxKind::LParen, SyntaxKind::RParen),
            SyntaxKind::LBrace => (SyntaxKind::LBrace, SyntaxKind::RBrace),
            SyntaxKind::LBracket => (SyntaxKind::LBracket, SyntaxKind::RBracket),
            SyntaxKind::Less => (SyntaxKind::Less, SyntaxKind::Greater),
            _ => return None,
        };
        let mut depth = 0usize;
        for idx in open..limit.min(self.len()) {
            match self.kind(idx) {
                Some(k) if k == lhs => depth += 1,
                Some(k) if k == rhs => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Index of the bracket opening the one closed at `close`.
    pub fn matching_open(&self, close: usize) -> Option<usize> {
        let (lhs, rhs) = match self.kind(close)? {
            SyntaxKind::RParen => (SyntaxKind::LParen, SyntaxKind::RParen),
            SyntaxKind::RBrace => (SyntaxKind::LBrace, SyntaxKind::RBrace),
            SyntaxKind::RBracket => (SyntaxKind::LBracket, SyntaxKind::RBracket),
            SyntaxKind::Greater => (SyntaxKind::Less, SyntaxKind::Greater),
            _ => return None,
        };
        let mut depth = 0usize;
        for idx in (0..=close).rev() {
            match self.kind(idx) {
                Some(k) if k == rhs => depth += 1,
                Some(k) if k == lhs => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Start of the statement or declaration header containing token `idx`:
    /// the token after the previous `;`, `{` or `}`.
    pub fn statement_start(&self, idx: usize) -> usize {
        (0..idx)
            .rev()
            .find(|&i| {
                matches!(
                    self.kind(i),
                    Some(SyntaxKind::Semicolon | SyntaxKind::LBrace | SyntaxKind::RBrace)
                )
            })
            .map_or(0, |i| i + 1)
    }

    /// Whether `offset` falls inside a comment or a string/char literal.
    pub fn in_comment_or_literal(&self, offset: usize) -> bool {
        self.opaque.iter().any(|token| {
            let (start, end) = (token.start(), token.end());
            if offset <= start || offset > end {
                return false;
            }
            if offset < end {
                return true;
            }
            let body = &self.text[start..end];
            match token.kind {
                SyntaxKind::LineComment => true,
                SyntaxKind::BlockComment => body.len() < 4 || !body.ends_with("*/"),
                SyntaxKind::StringLiteral => body.len() < 2 || !body.ends_with('"'),
                SyntaxKind::CharLiteral => body.len() < 2 || !body.ends_with('\''),
                SyntaxKind::TextBlock => body.len() < 6 || !body.ends_with("\"\"\""),
                _ => false,
            }
        })
    }
}
