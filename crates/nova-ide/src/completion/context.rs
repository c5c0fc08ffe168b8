//! Where the cursor sits, recovered from the tokens that precede it.

use std::ops::Range;

use nova_syntax::{DirectiveName, SyntaxKind};

use crate::scan::{self, BlockKind, Structure};
use crate::text::{dotted_start, ident_start, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderClause {
    Extends,
    Implements,
    Permits,
    Throws,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompletionLocation {
    /// Comments, literals and positions where nothing can be written.
    None,

    /// Before `module`: `open`, `module` or an import.
    ModuleHeader { is_open: bool },
    ModuleName,
    ModuleBody,
    Requires { modifiers: Vec<String> },
    ExportsPackage,
    OpensPackage,
    ExportsTo,
    OpensTo,
    ExportsTarget { listed: Vec<String> },
    OpensTarget { listed: Vec<String> },
    UsesType,
    ProvidesService,
    ProvidesWith,
    ProvidesImplementation { service: String, listed: Vec<String> },

    PackageDecl,
    Import { is_static: bool },
    TypeHeader { clause: HeaderClause, is_interface: bool },
    Annotation,
    AnnotationAttribute { annotation: String, given: Vec<String> },
    New,
    /// After `receiver.`; the receiver is compacted source text (`this.a`, `p.X`).
    MemberAccess { receiver: String },
    Catch,
    Expression,
    ClassBody,
    TopLevel,
}

#[derive(Debug)]
pub(crate) struct CompletionContext {
    pub location: CompletionLocation,
    pub prefix: String,
    /// Text replaced by an accepted proposal: the prefix.
    pub replace: Range<usize>,
    /// Number of tokens before the prefix.
    pub end: usize,
    pub structure: Structure,
}

pub(crate) fn analyze(src: &Source<'_>, offset: usize, module_info: bool) -> CompletionContext {
    if src.in_comment_or_literal(offset) {
        return CompletionContext {
            location: CompletionLocation::None,
            prefix: String::new(),
            replace: offset..offset,
            end: src.tokens_before(offset),
            structure: Structure::default(),
        };
    }
    let dotted = dotted_start(src.text, offset);
    let dotted_end = src.tokens_before(dotted);
    let stmt = src.statement_start(dotted_end);
    let dotted_ctx = |location| CompletionContext {
        location,
        prefix: src.text[dotted..offset].to_string(),
        replace: dotted..offset,
        end: dotted_end,
        structure: Structure::default(),
    };

    if module_info {
        return dotted_ctx(module_info_location(src, dotted_end));
    }
    if src.is_word(stmt, "package") {
        return dotted_ctx(CompletionLocation::PackageDecl);
    }
    if src.is_word(stmt, "import") {
        return dotted_ctx(CompletionLocation::Import {
            is_static: src.is_word(stmt + 1, "static"),
        });
    }

    let start = ident_start(src.text, offset);
    let end = src.tokens_before(start);
    let prefix = &src.text[start..offset];
    let structure = scan::scan(src, end);
    let location = if prefix.starts_with(|c: char| c.is_ascii_digit()) {
        CompletionLocation::None
    } else {
        java_location(src, end, &structure)
    };
    CompletionContext {
        location,
        prefix: prefix.to_string(),
        replace: start..offset,
        end,
        structure,
    }
}

fn module_info_location(src: &Source<'_>, end: usize) -> CompletionLocation {
    let Some(open) = (0..end).find(|&i| src.is(i, SyntaxKind::LBrace)) else {
        return module_header_location(src, end);
    };
    if src.matching_close(open, end).is_some() {
        return CompletionLocation::None;
    }
    let first = src.statement_start(end).max(open + 1);
    if first == end {
        return CompletionLocation::ModuleBody;
    }
    let Some(directive) = src.word(first).and_then(DirectiveName::from_keyword) else {
        return CompletionLocation::None;
    };
    let rest = first + 1;
    match directive {
        DirectiveName::Requires => {
            let mut modifiers: Vec<String> = Vec::new();
            for idx in rest..end {
                match src.word(idx) {
                    Some(word @ ("transitive" | "static"))
                        if !modifiers.iter().any(|m| m == word) =>
                    {
                        modifiers.push(word.to_string());
                    }
                    _ => return CompletionLocation::None,
                }
            }
            CompletionLocation::Requires { modifiers }
        }
        DirectiveName::Exports | DirectiveName::Opens => {
            let opens = directive == DirectiveName::Opens;
            if rest == end {
                return if opens {
                    CompletionLocation::OpensPackage
                } else {
                    CompletionLocation::ExportsPackage
                };
            }
            match (rest..end).find(|&i| src.is_word(i, "to")) {
                None if is_dotted_name(src, rest, end) => {
                    if opens {
                        CompletionLocation::OpensTo
                    } else {
                        CompletionLocation::ExportsTo
                    }
                }
                Some(to) if is_dotted_name(src, rest, to) => match listed_names(src, to + 1, end) {
                    Some(listed) if opens => CompletionLocation::OpensTarget { listed },
                    Some(listed) => CompletionLocation::ExportsTarget { listed },
                    None => CompletionLocation::None,
                },
                _ => CompletionLocation::None,
            }
        }
        DirectiveName::Uses if rest == end => CompletionLocation::UsesType,
        DirectiveName::Uses => CompletionLocation::None,
        DirectiveName::Provides => {
            if rest == end {
                return CompletionLocation::ProvidesService;
            }
            match (rest..end).find(|&i| src.is_word(i, "with")) {
                None if is_dotted_name(src, rest, end) => CompletionLocation::ProvidesWith,
                Some(with) if is_dotted_name(src, rest, with) => {
                    match listed_names(src, with + 1, end) {
                        Some(listed) => CompletionLocation::ProvidesImplementation {
                            service: compact(src.span_text(rest, with)),
                            listed,
                        },
                        None => CompletionLocation::None,
                    }
                }
                _ => CompletionLocation::None,
            }
        }
    }
}

fn module_header_location(src: &Source<'_>, end: usize) -> CompletionLocation {
    let stmt = src.statement_start(end);
    if src.is_word(stmt, "import") {
        return CompletionLocation::Import {
            is_static: src.is_word(stmt + 1, "static"),
        };
    }
    let mut is_open = false;
    let mut idx = skip_annotations(src, stmt, end);
    while idx < end {
        match src.word(idx) {
            Some("open") if !is_open => is_open = true,
            Some("module") if idx + 1 == end => return CompletionLocation::ModuleName,
            _ => return CompletionLocation::None,
        }
        idx += 1;
    }
    CompletionLocation::ModuleHeader { is_open }
}

fn skip_annotations(src: &Source<'_>, mut idx: usize, end: usize) -> usize {
    while idx < end && src.is(idx, SyntaxKind::At) {
        idx += 1;
        while idx < end && src.word(idx).is_some() {
            idx += 1;
            if src.is(idx, SyntaxKind::Dot) {
                idx += 1;
            } else {
                break;
            }
        }
        if src.is(idx, SyntaxKind::LParen) {
            match src.matching_close(idx, end) {
                Some(close) => idx = close + 1,
                None => return end,
            }
        }
    }
    idx
}

/// `a.b.c` spanning exactly tokens `lo..hi`.
fn is_dotted_name(src: &Source<'_>, lo: usize, hi: usize) -> bool {
    hi > lo
        && (hi - lo) % 2 == 1
        && (lo..hi).all(|i| {
            if (i - lo) % 2 == 0 {
                src.word(i).is_some()
            } else {
                src.is(i, SyntaxKind::Dot)
            }
        })
}

/// Comma-separated names in `lo..end`, which must end right after a comma
/// (or be empty).
fn listed_names(src: &Source<'_>, lo: usize, end: usize) -> Option<Vec<String>> {
    let mut names = Vec::new();
    let mut segment = lo;
    for idx in lo..end {
        if src.is(idx, SyntaxKind::Comma) {
            if !is_dotted_name(src, segment, idx) {
                return None;
            }
            names.push(compact(src.span_text(segment, idx)));
            segment = idx + 1;
        }
    }
    (segment == end).then_some(names)
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn java_location(src: &Source<'_>, end: usize, structure: &Structure) -> CompletionLocation {
    let stmt = src.statement_start(end);
    let prev = end.checked_sub(1);
    match prev.and_then(|p| src.kind(p)) {
        Some(SyntaxKind::At) => return CompletionLocation::Annotation,
        Some(SyntaxKind::Dot) => {
            return match prev.and_then(|dot| receiver_start(src, dot)) {
                Some((lo, dot)) => CompletionLocation::MemberAccess {
                    receiver: compact(src.span_text(lo, dot)),
                },
                None => CompletionLocation::None,
            };
        }
        Some(SyntaxKind::LParen | SyntaxKind::Comma) => {
            if let Some(location) = annotation_attribute(src, end) {
                return location;
            }
        }
        _ => {}
    }
    if let Some(p) = prev {
        if src.is_word(p, "new") {
            return CompletionLocation::New;
        }
        if src.is(p, SyntaxKind::LParen) && p > 0 && src.is_word(p - 1, "catch") {
            return CompletionLocation::Catch;
        }
    }

    match structure.innermost() {
        Some(BlockKind::Code { .. }) => CompletionLocation::Expression,
        innermost => {
            if (stmt..end).any(|i| src.is(i, SyntaxKind::Eq)) {
                return CompletionLocation::Expression;
            }
            if let Some(location) = type_header(src, stmt, end) {
                return location;
            }
            if innermost == Some(BlockKind::Type) {
                CompletionLocation::ClassBody
            } else {
                CompletionLocation::TopLevel
            }
        }
    }
}

/// First token of the receiver chain ending before the `.` at `dot`:
/// `a.b`, `this`, `foo(x).bar`.
fn receiver_start(src: &Source<'_>, dot: usize) -> Option<(usize, usize)> {
    let mut idx = dot;
    let mut lo = None;
    loop {
        let last = idx.checked_sub(1)?;
        let start = match src.kind(last)? {
            SyntaxKind::Identifier => last,
            SyntaxKind::RParen | SyntaxKind::RBracket => {
                let open = src.matching_open(last)?;
                match open.checked_sub(1) {
                    Some(callee) if src.word(callee).is_some() => callee,
                    _ => open,
                }
            }
            _ => break,
        };
        lo = Some(start);
        match start.checked_sub(1) {
            Some(before) if src.is(before, SyntaxKind::Dot) => idx = before,
            _ => break,
        }
    }
    lo.map(|lo| (lo, dot))
}

fn annotation_attribute(src: &Source<'_>, end: usize) -> Option<CompletionLocation> {
    let mut depth = 0usize;
    let mut open = None;
    for idx in (0..end).rev() {
        match src.kind(idx)? {
            SyntaxKind::RParen => depth += 1,
            SyntaxKind::LParen if depth == 0 => {
                open = Some(idx);
                break;
            }
            SyntaxKind::LParen => depth -= 1,
            SyntaxKind::Semicolon | SyntaxKind::LBrace | SyntaxKind::RBrace => return None,
            _ => {}
        }
    }
    let open = open?;
    let mut lo = open.checked_sub(1)?;
    src.word(lo)?;
    while lo >= 2 && src.is(lo - 1, SyntaxKind::Dot) && src.word(lo - 2).is_some() {
        lo -= 2;
    }
    if lo == 0 || !src.is(lo - 1, SyntaxKind::At) {
        return None;
    }
    let given = (open + 1..end)
        .filter(|&i| src.is(i + 1, SyntaxKind::Eq) && i + 1 < end)
        .filter_map(|i| src.word(i))
        .map(str::to_string)
        .collect();
    Some(CompletionLocation::AnnotationAttribute {
        annotation: compact(src.span_text(lo, open)),
        given,
    })
}

fn type_header(src: &Source<'_>, stmt: usize, end: usize) -> Option<CompletionLocation> {
    let (at, clause) = (stmt..end).rev().find_map(|i| {
        let clause = match src.word(i)? {
            "extends" => HeaderClause::Extends,
            "implements" => HeaderClause::Implements,
            "permits" => HeaderClause::Permits,
            "throws" => HeaderClause::Throws,
            _ => return None,
        };
        Some((i, clause))
    })?;
    let last = end - 1;
    if last != at && !src.is(last, SyntaxKind::Comma) {
        return None;
    }
    let is_interface = (stmt..at).any(|i| src.is_word(i, "interface"));
    Some(CompletionLocation::TypeHeader {
        clause,
        is_interface,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at_end(text: &str, module_info: bool) -> CompletionContext {
        let src = Source::new(text);
        analyze(&src, text.len(), module_info)
    }

    fn module(text: &str) -> CompletionLocation {
        at_end(text, true).location
    }

    fn java(text: &str) -> CompletionLocation {
        at_end(text, false).location
    }

    #[test]
    fn module_info_locations() {
        assert_eq!(module(""), CompletionLocation::ModuleHeader { is_open: false });
        assert_eq!(module("open "), CompletionLocation::ModuleHeader { is_open: true });
        assert_eq!(module("module "), CompletionLocation::ModuleName);
        assert_eq!(module("module my.mod { "), CompletionLocation::ModuleBody);
        assert_eq!(module("module m { requires a; "), CompletionLocation::ModuleBody);
        assert_eq!(
            module("module m { requires transitive "),
            CompletionLocation::Requires {
                modifiers: vec!["transitive".into()]
            }
        );
        assert_eq!(module("module m { exports "), CompletionLocation::ExportsPackage);
        assert_eq!(module("module m { opens a.b "), CompletionLocation::OpensTo);
        assert_eq!(
            module("module m { exports pack1 to a.b, com"),
            CompletionLocation::ExportsTarget {
                listed: vec!["a.b".into()]
            }
        );
        assert_eq!(module("module m { uses "), CompletionLocation::UsesType);
        assert_eq!(module("module m { provides S w"), CompletionLocation::ProvidesWith);
        assert_eq!(
            module("module m { provides p.S with p.A, "),
            CompletionLocation::ProvidesImplementation {
                service: "p.S".into(),
                listed: vec!["p.A".into()]
            }
        );
        assert_eq!(module("module m { } "), CompletionLocation::None);
        assert_eq!(module("module m { exports p to q r"), CompletionLocation::None);
    }

    #[test]
    fn dotted_prefix_in_module_info() {
        let ctx = at_end("module m { requires org.ecl", true);
        assert_eq!(ctx.prefix, "org.ecl");
        assert_eq!(ctx.replace, 20..27);
    }

    #[test]
    fn java_locations() {
        assert_eq!(java("package p; import java.ut"), CompletionLocation::Import { is_static: false });
        assert_eq!(at_end("import java.ut", false).prefix, "java.ut");
        assert_eq!(
            java("class A extends "),
            CompletionLocation::TypeHeader {
                clause: HeaderClause::Extends,
                is_interface: false
            }
        );
        assert_eq!(
            java("interface I extends A, "),
            CompletionLocation::TypeHeader {
                clause: HeaderClause::Extends,
                is_interface: true
            }
        );
        assert_eq!(java("class A extends B "), CompletionLocation::TopLevel);
        assert_eq!(java("class A { void m() throws IO"), CompletionLocation::TypeHeader {
            clause: HeaderClause::Throws,
            is_interface: false
        });
        assert_eq!(java("class A { St"), CompletionLocation::ClassBody);
        assert_eq!(java("class A { int x = "), CompletionLocation::Expression);
        assert_eq!(java("class A { void m() { fo"), CompletionLocation::Expression);
        assert_eq!(java("class A { void m() { new Fo"), CompletionLocation::New);
        assert_eq!(
            java("class A { void m() { try {} catch ("),
            CompletionLocation::Catch
        );
        assert_eq!(java("@Over"), CompletionLocation::Annotation);
        assert_eq!(
            java("@p.Ann(name = 1, "),
            CompletionLocation::AnnotationAttribute {
                annotation: "p.Ann".into(),
                given: vec!["name".into()]
            }
        );
        assert_eq!(
            java("class A { void m() { this.a.fo"),
            CompletionLocation::MemberAccess {
                receiver: "this.a".into()
            }
        );
        assert_eq!(
            java("class A { void m() { return foo(1, 2).ba"),
            CompletionLocation::MemberAccess {
                receiver: "foo(1,2)".into()
            }
        );
        assert_eq!(java("class A { // fo"), CompletionLocation::None);
        assert_eq!(java("class A { String s = \"fo"), CompletionLocation::None);
        assert_eq!(java("class A { int x = 12"), CompletionLocation::None);
    }
}
