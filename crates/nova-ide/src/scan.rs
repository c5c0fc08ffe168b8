//! Block structure and local variables of a Java buffer, recovered from the
//! token stream up to the cursor.

use nova_core::is_java_keyword;
use nova_syntax::SyntaxKind;
use nova_types::{TypeSig, PRIMITIVES};

use crate::text::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// Class, interface, enum, record or anonymous class body.
    Type,
    /// Method, constructor, initializer or lambda body, and blocks nested in them.
    Code { is_static: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalVar {
    pub name: String,
    /// `None` for `var` and untyped lambda parameters.
    pub ty: Option<TypeSig>,
    pub offset: usize,
}

#[derive(Debug)]
struct Binding {
    depth: usize,
    /// Lambda parameters of an expression lambda, dropped at the end of the statement.
    statement: bool,
    var: LocalVar,
}

#[derive(Debug, Default)]
pub(crate) struct Structure {
    pub blocks: Vec<BlockKind>,
    bindings: Vec<Binding>,
}

impl Structure {
    pub fn innermost(&self) -> Option<BlockKind> {
        self.blocks.last().copied()
    }

    pub fn in_code(&self) -> bool {
        matches!(self.innermost(), Some(BlockKind::Code { .. }))
    }

    pub fn is_static(&self) -> bool {
        matches!(self.innermost(), Some(BlockKind::Code { is_static: true }))
    }

    /// Locals in scope; a later declaration shadows an earlier one of the same name.
    pub fn locals(&self) -> Vec<&LocalVar> {
        let mut out: Vec<&LocalVar> = Vec::new();
        for binding in self.bindings.iter().rev() {
            if !out.iter().any(|v| v.name == binding.var.name) {
                out.push(&binding.var);
            }
        }
        out
    }

    fn declare(&mut self, vars: Vec<LocalVar>, statement: bool) {
        let depth = self.blocks.len();
        self.bindings.extend(vars.into_iter().map(|var| Binding {
            depth,
            statement,
            var,
        }));
    }
}

/// Walk tokens `0..end` of `src`.
pub(crate) fn scan(src: &Source<'_>, end: usize) -> Structure {
    let end = end.min(src.len());
    let mut st = Structure::default();
    let mut idx = 0;
    while idx < end {
        match src.kind(idx) {
            Some(SyntaxKind::LBrace) => {
                let member_body = !st.in_code();
                let kind = classify_block(src, idx, st.innermost());
                st.blocks.push(kind);
                if let BlockKind::Code { .. } = kind {
                    let params = header_params(src, idx, member_body);
                    st.declare(params, false);
                }
            }
            Some(SyntaxKind::RBrace) => {
                st.blocks.pop();
                let depth = st.blocks.len();
                st.bindings.retain(|b| b.depth <= depth);
            }
            Some(SyntaxKind::Semicolon) => {
                let depth = st.blocks.len();
                st.bindings.retain(|b| !(b.statement && b.depth == depth));
            }
            Some(SyntaxKind::Arrow) if !src.is(idx + 1, SyntaxKind::LBrace) && st.in_code() => {
                let params = lambda_params(src, idx);
                st.declare(params, true);
            }
            Some(SyntaxKind::Identifier) if st.in_code() => {
                if src.is_word(idx, "instanceof") {
                    if let Some((ty, next)) = parse_type(src, idx + 1, end) {
                        if let Some(name) = local_name(src, next, end) {
                            st.declare(vec![local(src, next, name, Some(ty))], false);
                            idx = next;
                        }
                    }
                } else if at_statement_start(src, idx) {
                    if let Some((vars, next)) = local_declaration(src, idx, end) {
                        st.declare(vars, false);
                        idx = next.saturating_sub(1).max(idx);
                    }
                }
            }
            _ => {}
        }
        idx += 1;
    }
    st
}

fn local(src: &Source<'_>, idx: usize, name: &str, ty: Option<TypeSig>) -> LocalVar {
    LocalVar {
        name: name.to_string(),
        ty,
        offset: src.tokens[idx].start(),
    }
}

fn at_statement_start(src: &Source<'_>, idx: usize) -> bool {
    idx == 0
        || matches!(
            src.kind(idx - 1),
            Some(SyntaxKind::Semicolon | SyntaxKind::LBrace | SyntaxKind::RBrace)
        )
}

fn classify_block(src: &Source<'_>, open: usize, enclosing: Option<BlockKind>) -> BlockKind {
    let start = src.statement_start(open);
    let declares_type = (start..open).any(|i| {
        matches!(
            src.word(i),
            Some("class" | "interface" | "enum" | "record")
        ) && !src.is(i.wrapping_sub(1), SyntaxKind::Dot)
    });
    if declares_type || is_anonymous_class(src, start, open) {
        return BlockKind::Type;
    }
    match enclosing {
        None | Some(BlockKind::Type) => BlockKind::Code {
            is_static: (start..open).any(|i| src.is_word(i, "static")),
        },
        Some(code) => code,
    }
}

/// `new X(...) {` or `new X<T>() {`.
fn is_anonymous_class(src: &Source<'_>, start: usize, open: usize) -> bool {
    if open == 0 || !src.is(open - 1, SyntaxKind::RParen) {
        return false;
    }
    let Some(paren) = src.matching_open(open - 1) else {
        return false;
    };
    let mut idx = paren;
    while idx > start {
        idx -= 1;
        match src.kind(idx) {
            Some(SyntaxKind::Identifier) if src.is_word(idx, "new") => return true,
            Some(
                SyntaxKind::Identifier
                | SyntaxKind::Dot
                | SyntaxKind::Less
                | SyntaxKind::Greater
                | SyntaxKind::Comma
                | SyntaxKind::Question,
            ) => {}
            _ => return false,
        }
    }
    false
}

/// Parameters introduced by the header of the code block opened at `open`:
/// method and constructor parameters, `for`, `catch` and `try` resources, and
/// lambda parameters.
fn header_params(src: &Source<'_>, open: usize, member_body: bool) -> Vec<LocalVar> {
    let start = src.statement_start(open);
    if open == 0 || start >= open {
        return Vec::new();
    }
    if src.is(open - 1, SyntaxKind::Arrow) {
        return lambda_params(src, open - 1);
    }
    let close = if src.is(open - 1, SyntaxKind::RParen) {
        open - 1
    } else {
        match (start..open).find(|&i| src.is_word(i, "throws")) {
            Some(throws) if throws > 0 && src.is(throws - 1, SyntaxKind::RParen) => throws - 1,
            _ => return Vec::new(),
        }
    };
    let Some(paren) = src.matching_open(close) else {
        return Vec::new();
    };
    if paren == 0 {
        return Vec::new();
    }
    match src.word(paren - 1) {
        Some("for" | "catch" | "try") => declarations(src, paren + 1, close),
        Some("if" | "while" | "switch" | "synchronized" | "return" | "new") => Vec::new(),
        Some(_) if member_body => declarations(src, paren + 1, close),
        _ => Vec::new(),
    }
}

fn lambda_params(src: &Source<'_>, arrow: usize) -> Vec<LocalVar> {
    if arrow == 0 {
        return Vec::new();
    }
    let before = arrow - 1;
    match src.kind(before) {
        Some(SyntaxKind::Identifier) => vec![local(src, before, src.text_of(before), None)],
        Some(SyntaxKind::RParen) => match src.matching_open(before) {
            Some(open) => declarations(src, open + 1, before),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Declarations inside a parenthesised header, `lo..hi` exclusive.
///
/// The list is cut at the first top-level `;` or `:` (`for` headers); each
/// comma-separated segment is cut at `=`.
fn declarations(src: &Source<'_>, lo: usize, hi: usize) -> Vec<LocalVar> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut seg_start = lo;
    let mut cut = hi;
    for idx in lo..hi {
        match src.kind(idx) {
            Some(SyntaxKind::LParen | SyntaxKind::Less | SyntaxKind::LBracket) => depth += 1,
            Some(SyntaxKind::RParen | SyntaxKind::Greater | SyntaxKind::RBracket) => depth -= 1,
            Some(SyntaxKind::Semicolon | SyntaxKind::Colon) if depth == 0 => {
                cut = idx;
                break;
            }
            Some(SyntaxKind::Comma) if depth == 0 => {
                segments.push((seg_start, idx));
                seg_start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push((seg_start, cut));

    let mut out = Vec::new();
    let mut last_ty: Option<TypeSig> = None;
    for (lo, hi) in segments {
        let hi = (lo..hi).find(|&i| src.is(i, SyntaxKind::Eq)).unwrap_or(hi);
        let lo = skip_modifiers(src, lo, hi);
        if lo >= hi {
            continue;
        }
        if hi - lo == 1 {
            if let Some(name) = src.word(lo).filter(|w| !is_java_keyword(w)) {
                out.push(local(src, lo, name, last_ty.clone()));
            }
            continue;
        }
        if let Some((ty, next)) = parse_type(src, lo, hi) {
            if let Some(name) = local_name(src, next, hi) {
                out.push(local(src, next, name, Some(ty.clone())));
                last_ty = Some(ty);
            }
        }
    }
    out
}

/// `final` and annotations.
fn skip_modifiers(src: &Source<'_>, mut idx: usize, end: usize) -> usize {
    while idx < end {
        if src.is_word(idx, "final") {
            idx += 1;
        } else if src.is(idx, SyntaxKind::At) && src.kind(idx + 1) == Some(SyntaxKind::Identifier) {
            idx += 2;
            while src.is(idx, SyntaxKind::Dot) && src.word(idx + 1).is_some() {
                idx += 2;
            }
            if src.is(idx, SyntaxKind::LParen) {
                match src.matching_close(idx, end) {
                    Some(close) => idx = close + 1,
                    None => return end,
                }
            }
        } else {
            break;
        }
    }
    idx
}

fn local_name<'a>(src: &Source<'a>, idx: usize, end: usize) -> Option<&'a str> {
    if idx >= end {
        return None;
    }
    src.word(idx).filter(|w| !is_java_keyword(w))
}

/// Parse a type starting at token `idx`: `a.b.C<...>[]...`.
///
/// Returns the type and the index of the first token after it.
pub(crate) fn parse_type(src: &Source<'_>, idx: usize, end: usize) -> Option<(TypeSig, usize)> {
    let first = src.word(idx).filter(|_| idx < end)?;
    if is_java_keyword(first) && !PRIMITIVES.contains(&first) {
        return None;
    }
    let mut next = idx + 1;
    while next + 1 < end && src.is(next, SyntaxKind::Dot) && src.word(next + 1).is_some() {
        next += 2;
    }
    if next < end && src.is(next, SyntaxKind::Less) {
        next = src.matching_close(next, end)? + 1;
    }
    let mut extra_dims = 0u8;
    while next + 1 < end && src.is(next, SyntaxKind::LBracket) && src.is(next + 1, SyntaxKind::RBracket)
    {
        next += 2;
    }
    let text_end = next;
    if next < end && src.is(next, SyntaxKind::Ellipsis) {
        extra_dims = 1;
        next += 1;
    }
    let mut ty = TypeSig::parse(src.span_text(idx, text_end)).ok()?;
    ty.array_dims = ty.array_dims.saturating_add(extra_dims);
    Some((ty, next))
}

/// `Type name (= ...)?(, name (= ...)?)*` at a statement start.
fn local_declaration(src: &Source<'_>, idx: usize, end: usize) -> Option<(Vec<LocalVar>, usize)> {
    let start = skip_modifiers(src, idx, end);
    let (ty, name_idx) = parse_type(src, start, end)?;
    let name = local_name(src, name_idx, end)?;
    match src.kind(name_idx + 1) {
        Some(SyntaxKind::Eq | SyntaxKind::Semicolon | SyntaxKind::Comma | SyntaxKind::Colon) => {}
        None => {}
        Some(_) if name_idx + 1 >= end => {}
        Some(_) => return None,
    }
    let ty = (ty.name != "var").then_some(ty);
    let mut vars = vec![local(src, name_idx, name, ty.clone())];

    // Further declarators: `, name` at nesting depth zero.
    let mut depth = 0i32;
    let mut next = name_idx + 1;
    while next < end {
        match src.kind(next) {
            Some(SyntaxKind::LParen | SyntaxKind::LBrace | SyntaxKind::LBracket) => depth += 1,
            Some(SyntaxKind::RParen | SyntaxKind::RBrace | SyntaxKind::RBracket) => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            Some(SyntaxKind::Semicolon) if depth == 0 => break,
            Some(SyntaxKind::Comma) if depth == 0 => {
                if let Some(name) = local_name(src, next + 1, end) {
                    vars.push(local(src, next + 1, name, ty.clone()));
                }
            }
            _ => {}
        }
        next += 1;
    }
    Some((vars, name_idx + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn locals_at(text_with_caret: &str) -> (Vec<(String, Option<String>)>, Option<BlockKind>) {
        let offset = text_with_caret.find("<|>").expect("caret");
        let text = text_with_caret.replace("<|>", "");
        let src = Source::new(&text);
        let st = scan(&src, src.tokens_before(offset));
        let mut locals: Vec<_> = st
            .locals()
            .into_iter()
            .map(|v| (v.name.clone(), v.ty.as_ref().map(ToString::to_string)))
            .collect();
        locals.sort();
        (locals, st.innermost())
    }

    fn l(name: &str, ty: Option<&str>) -> (String, Option<String>) {
        (name.to_string(), ty.map(str::to_string))
    }

    #[test]
    fn method_params_and_locals() {
        let (locals, block) = locals_at(
            "class A { void m(final String s, int... xs) { java.util.List<String> list = null; int a = 1, b; <|> } }",
        );
        assert_eq!(
            locals,
            vec![
                l("a", Some("int")),
                l("b", Some("int")),
                l("list", Some("java.util.List<String>")),
                l("s", Some("String")),
                l("xs", Some("int[]")),
            ]
        );
        assert_eq!(block, Some(BlockKind::Code { is_static: false }));
    }

    #[test]
    fn block_scoping() {
        let (locals, _) = locals_at("class A { static void m() { { int inner; } for (String s : xs) { } <|> } }");
        assert_eq!(locals, vec![]);

        let (locals, block) = locals_at("class A { static void m() { for (int i = 0; i < 3; i++) { <|> } } }");
        assert_eq!(locals, vec![l("i", Some("int"))]);
        assert_eq!(block, Some(BlockKind::Code { is_static: true }));
    }

    #[test]
    fn lambdas_catch_and_patterns() {
        let (locals, _) = locals_at(
            "class A { void m(Object o) { run((x, y) -> { <|> }); } }",
        );
        assert_eq!(locals, vec![l("o", Some("Object")), l("x", None), l("y", None)]);

        let (locals, _) = locals_at("class A { void m() { try { } catch (IOException e) { <|> } } }");
        assert_eq!(locals, vec![l("e", Some("IOException"))]);

        let (locals, _) = locals_at("class A { void m(Object o) { if (o instanceof String str) { <|> } } }");
        assert_eq!(locals, vec![l("o", Some("Object")), l("str", Some("String"))]);

        let (locals, _) = locals_at("class A { void m() { var v = 1; list.forEach(item -> <|>) } }");
        assert_eq!(locals, vec![l("item", None), l("v", None)]);
    }

    #[test]
    fn anonymous_classes_are_type_bodies() {
        let (_, block) = locals_at("class A { void m() { new Runnable() { <|> }; } }");
        assert_eq!(block, Some(BlockKind::Type));
        let (_, block) = locals_at("class A { <|> }");
        assert_eq!(block, Some(BlockKind::Type));
        let (_, block) = locals_at("<|>");
        assert_eq!(block, None);
    }
}
