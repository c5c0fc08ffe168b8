//! Code select: the declarations an identifier under the cursor denotes.
//!
//! Names are resolved against the declaration model the way the compiler
//! would: locals first, then fields of the enclosing types, then types
//! visible by simple name, then packages. Method names are matched by
//! arity when the call's argument list is complete; otherwise every
//! overload is returned.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use nova_core::{is_java_keyword, TextSize};
use nova_hir::{ImportDecl, MethodDecl};
use nova_modules::ModuleName;
use nova_project::{Project, TypeRef, TypeScope, Workspace};
use nova_resolve::AccessContext;
use nova_syntax::SyntaxKind;
use serde::Serialize;

use crate::completion::ScopeHints;
use crate::lookup::{Lookup, Receiver};
use crate::scan::scan;
use crate::text::{clamp_offset, Source};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectRequest {
    pub path: String,
    /// Byte offset of the selection start.
    pub offset: usize,
    /// Selection length; zero selects the identifier touching `offset`.
    pub length: usize,
    pub hints: ScopeHints,
}

impl SelectRequest {
    pub fn new(path: impl Into<String>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
            length: 0,
            hints: ScopeHints::default(),
        }
    }

    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: ScopeHints) -> Self {
        self.hints = hints;
        self
    }
}

/// A declaration found by [`code_select`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectedElement {
    Module {
        name: String,
    },
    Package {
        name: String,
    },
    Type {
        name: String,
    },
    Field {
        owner: String,
        name: String,
    },
    Method {
        owner: String,
        name: String,
        parameters: Vec<String>,
    },
    Local {
        name: String,
    },
    AnnotationAttribute {
        owner: String,
        name: String,
    },
}

impl SelectedElement {
    fn method(owner: &TypeRef<'_>, method: &MethodDecl) -> Self {
        SelectedElement::Method {
            owner: owner.name.to_string(),
            name: method.name.to_string(),
            parameters: method.params.iter().map(|p| p.ty.to_string()).collect(),
        }
    }
}

/// `<kind> <descriptor>`, e.g. `method p.X.foo(int)` or `local s`.
impl fmt::Display for SelectedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectedElement::Module { name } => write!(f, "module {name}"),
            SelectedElement::Package { name } => write!(f, "package {name}"),
            SelectedElement::Type { name } => write!(f, "type {name}"),
            SelectedElement::Field { owner, name } => write!(f, "field {owner}.{name}"),
            SelectedElement::Method {
                owner,
                name,
                parameters,
            } => write!(f, "method {owner}.{name}({})", parameters.join(", ")),
            SelectedElement::Local { name } => write!(f, "local {name}"),
            SelectedElement::AnnotationAttribute { owner, name } => {
                write!(f, "attribute {owner}.{name}")
            }
        }
    }
}

pub fn code_select(ws: &Workspace, request: &SelectRequest) -> Vec<SelectedElement> {
    let _span = tracing::debug_span!(
        target: "nova.select",
        "code_select",
        path = %request.path,
        offset = request.offset,
        length = request.length
    )
    .entered();

    let Some(text) = ws.file_text(&request.path) else {
        tracing::debug!(target: "nova.select", "no text for file");
        return Vec::new();
    };
    let src = Source::new(text);
    let offset = clamp_offset(text, request.offset);
    let end = clamp_offset(text, request.offset.saturating_add(request.length));
    if src.in_comment_or_literal(offset) {
        return Vec::new();
    }
    let Some(idx) = selected_token(&src, offset, end) else {
        tracing::debug!(target: "nova.select", "no identifier at selection");
        return Vec::new();
    };
    let (project, unit) = match ws.unit(&request.path) {
        Some((project, unit)) => (project, Cow::Borrowed(unit)),
        None => {
            let Some(project) = ws.project_of_file(&request.path) else {
                tracing::debug!(target: "nova.select", "file not in any project");
                return Vec::new();
            };
            let unit = crate::completion::unit_from_tokens(&request.path, &src);
            (project, Cow::Owned(unit))
        }
    };

    let elements = if request.path.ends_with("module-info.java") {
        select_in_module_info(ws, project, &src, idx)
    } else {
        let structure = scan(&src, idx + 1);
        let position = TextSize::from(src.tokens[idx].start() as u32);
        let access = AccessContext::new(ws, project, &unit, position);
        let lookup = Lookup {
            ws,
            project,
            unit: &unit,
            access: &access,
            structure: &structure,
            hints: &request.hints,
            offset: position,
        };
        select_in_java(&lookup, &src, idx)
    };
    tracing::debug!(target: "nova.select", count = elements.len(), "selected");
    elements
}

/// The identifier token selected by `offset..end`: the last identifier
/// inside a non-empty selection, else the identifier touching `offset`.
fn selected_token(src: &Source<'_>, offset: usize, end: usize) -> Option<usize> {
    if end > offset {
        return src.tokens.iter().rposition(|t| {
            t.kind == SyntaxKind::Identifier && t.start() >= offset && t.end() <= end
        });
    }
    src.token_at(offset)
        .filter(|&idx| src.is(idx, SyntaxKind::Identifier))
}

/// Token indices of the first and last identifiers of the dotted name
/// through `idx`.
fn dotted_span(src: &Source<'_>, idx: usize) -> (usize, usize) {
    let mut first = idx;
    while first >= 2
        && src.is(first - 1, SyntaxKind::Dot)
        && src.is(first - 2, SyntaxKind::Identifier)
    {
        first -= 2;
    }
    let mut last = idx;
    while src.is(last + 1, SyntaxKind::Dot) && src.is(last + 2, SyntaxKind::Identifier) {
        last += 2;
    }
    (first, last)
}

fn dotted_text(src: &Source<'_>, first: usize, last: usize) -> String {
    (first..=last)
        .step_by(2)
        .map(|i| src.text_of(i))
        .collect::<Vec<_>>()
        .join(".")
}

fn package_exists(ws: &Workspace, name: &str) -> bool {
    let nested = format!("{name}.");
    ws.projects().iter().any(|project| {
        ws.packages(&project.name)
            .iter()
            .any(|p| p == name || p.starts_with(&nested))
    })
}

fn type_or_package(ws: &Workspace, project: &Project, name: &str) -> Vec<SelectedElement> {
    if let Some(ty) = ws.find_type_from(project, name) {
        return vec![SelectedElement::Type {
            name: ty.name.to_string(),
        }];
    }
    if package_exists(ws, name) {
        return vec![SelectedElement::Package {
            name: name.to_string(),
        }];
    }
    Vec::new()
}

fn select_in_module_info(
    ws: &Workspace,
    project: &Project,
    src: &Source<'_>,
    idx: usize,
) -> Vec<SelectedElement> {
    let (first, last) = dotted_span(src, idx);
    let head = src.statement_start(first);
    let before = |word: &str| (head..first).any(|i| src.is_word(i, word));
    let module = |name: String| {
        if ws.module_graph().contains(&ModuleName::new(name.as_str())) {
            vec![SelectedElement::Module { name }]
        } else {
            Vec::new()
        }
    };

    if before("module") {
        return module(dotted_text(src, first, last));
    }
    match src.word(head) {
        Some("requires") => {
            // `requires static m`: the modifier itself selects nothing.
            if first == last && src.is(idx + 1, SyntaxKind::Identifier) {
                return Vec::new();
            }
            module(dotted_text(src, first, last))
        }
        Some("exports" | "opens") if before("to") => module(dotted_text(src, first, last)),
        Some("exports" | "opens") => {
            let name = dotted_text(src, first, last);
            if package_exists(ws, &name) {
                vec![SelectedElement::Package { name }]
            } else {
                Vec::new()
            }
        }
        Some("uses" | "provides" | "import") => {
            type_or_package(ws, project, &dotted_text(src, first, idx))
        }
        _ => Vec::new(),
    }
}

fn select_in_java(lookup: &Lookup<'_, '_>, src: &Source<'_>, idx: usize) -> Vec<SelectedElement> {
    let ws = lookup.ws;
    let Some(word) = src.word(idx) else {
        return Vec::new();
    };
    let (first, _) = dotted_span(src, idx);
    let head = src.statement_start(first);

    if src.is_word(head, "package") {
        return vec![SelectedElement::Package {
            name: dotted_text(src, first, idx),
        }];
    }
    if src.is_word(head, "import") {
        return select_in_import(lookup, src, first, idx, src.is_word(head + 1, "static"));
    }
    if is_java_keyword(word) {
        return Vec::new();
    }
    if let Some(attribute) = annotation_attribute(lookup, src, idx) {
        return vec![attribute];
    }

    let scope = lookup.access.scope();
    let call_arity = src
        .is(idx + 1, SyntaxKind::LParen)
        .then(|| argument_count(src, idx + 1));

    if first == idx {
        // A receiver that is not a plain name (`foo().bar`) is not evaluated.
        if idx > 0 && src.is(idx - 1, SyntaxKind::Dot) {
            return Vec::new();
        }
        if idx > 0 && src.is_word(idx - 1, "new") {
            return resolved_type(lookup, &scope, word);
        }
        if let Some(arity) = call_arity {
            return unqualified_methods(lookup, word, arity);
        }
        if lookup.local(word).is_some() {
            return vec![SelectedElement::Local {
                name: word.to_string(),
            }];
        }
        if let Some((owner, field)) = lookup.enclosing_field(word) {
            return vec![SelectedElement::Field {
                owner: owner.name.to_string(),
                name: field.name.to_string(),
            }];
        }
        if let Some(field) = static_import_field(lookup, word) {
            return vec![field];
        }
        if let Some(ty) = ws.resolve_type(&scope, word) {
            return vec![SelectedElement::Type {
                name: ty.name.to_string(),
            }];
        }
        return type_or_package(ws, lookup.project, word);
    }

    let receiver_text = dotted_text(src, first, idx - 2);
    let Some(receiver) = lookup.resolve_receiver(&scope, &receiver_text) else {
        return Vec::new();
    };
    match receiver {
        Receiver::Instance(ty) | Receiver::Static(ty) => {
            if let Some(arity) = call_arity {
                return methods_named(lookup, &ty, word, arity);
            }
            if let Some((owner, field)) = lookup.find_field(&ty, word) {
                return vec![SelectedElement::Field {
                    owner: owner.name.to_string(),
                    name: field.name.to_string(),
                }];
            }
            match lookup.member_segment(Receiver::Static(ty), word) {
                Some(Receiver::Static(nested)) => vec![SelectedElement::Type {
                    name: nested.name.to_string(),
                }],
                _ => Vec::new(),
            }
        }
        Receiver::Package(package) => {
            type_or_package(ws, lookup.project, &format!("{package}.{word}"))
        }
    }
}

fn resolved_type(
    lookup: &Lookup<'_, '_>,
    scope: &TypeScope<'_>,
    written: &str,
) -> Vec<SelectedElement> {
    lookup
        .ws
        .resolve_type(scope, written)
        .map(|ty| SelectedElement::Type {
            name: ty.name.to_string(),
        })
        .into_iter()
        .collect()
}

fn select_in_import(
    lookup: &Lookup<'_, '_>,
    src: &Source<'_>,
    first: usize,
    idx: usize,
    is_static: bool,
) -> Vec<SelectedElement> {
    let name = dotted_text(src, first, idx);
    let found = type_or_package(lookup.ws, lookup.project, &name);
    if !found.is_empty() || !is_static {
        return found;
    }
    let Some((qualifier, member)) = name.rsplit_once('.') else {
        return Vec::new();
    };
    let Some(owner) = lookup.ws.find_type_from(lookup.project, qualifier) else {
        return Vec::new();
    };
    let mut out: Vec<SelectedElement> = owner
        .decl
        .fields
        .iter()
        .filter(|f| f.is_static() && f.name.as_str() == member)
        .map(|f| SelectedElement::Field {
            owner: owner.name.to_string(),
            name: f.name.to_string(),
        })
        .collect();
    out.extend(
        owner
            .decl
            .methods
            .iter()
            .filter(|m| m.is_static() && m.name.as_str() == member)
            .map(|m| SelectedElement::method(&owner, m)),
    );
    out
}

fn static_import_field(lookup: &Lookup<'_, '_>, name: &str) -> Option<SelectedElement> {
    lookup.unit.imports.iter().find_map(|import| {
        let ty = match import {
            ImportDecl::StaticSingle { ty, member } if member.as_str() == name => ty,
            ImportDecl::StaticStar { ty } => ty,
            _ => return None,
        };
        let owner = lookup.ws.find_type_from(lookup.project, ty.as_str())?;
        let field = owner
            .decl
            .fields
            .iter()
            .find(|f| f.is_static() && f.name.as_str() == name)?;
        Some(SelectedElement::Field {
            owner: owner.name.to_string(),
            name: field.name.to_string(),
        })
    })
}

/// Number of arguments of the call whose `(` is at `open`, or `None` while
/// the argument list is unterminated.
fn argument_count(src: &Source<'_>, open: usize) -> Option<usize> {
    let close = src.matching_close(open, src.len())?;
    if close == open + 1 {
        return Some(0);
    }
    let mut depth = 0usize;
    let mut commas = 0;
    for idx in open + 1..close {
        match src.kind(idx) {
            Some(SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace) => depth += 1,
            Some(SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace) => {
                depth = depth.saturating_sub(1);
            }
            Some(SyntaxKind::Comma) if depth == 0 => commas += 1,
            _ => {}
        }
    }
    Some(commas + 1)
}

/// Methods `name` of `ty` and its supertypes, overrides reported once.
/// Without a matching arity, every overload is a candidate.
fn methods_named(
    lookup: &Lookup<'_, '_>,
    ty: &TypeRef<'_>,
    name: &str,
    arity: Option<usize>,
) -> Vec<SelectedElement> {
    let mut seen = BTreeSet::new();
    let mut all = Vec::new();
    for owner in std::iter::once(*ty).chain(lookup.ws.supertypes(ty)) {
        for method in owner.decl.methods.iter().filter(|m| m.name.as_str() == name) {
            if !lookup
                .access
                .member_is_accessible(&owner, method.modifiers.visibility)
            {
                continue;
            }
            let params: Vec<String> = method
                .params
                .iter()
                .map(|p| p.ty.erasure().simple_name().to_string())
                .collect();
            if seen.insert(params) {
                all.push((owner, method));
            }
        }
    }
    let matching: Vec<_> = all
        .iter()
        .filter(|(_, m)| arity.map_or(true, |n| m.accepts_arity(n)))
        .collect();
    let chosen: Vec<_> = if matching.is_empty() {
        all.iter().collect()
    } else {
        matching
    };
    chosen
        .into_iter()
        .map(|(owner, method)| SelectedElement::method(owner, method))
        .collect()
}

/// An unqualified call: the innermost enclosing type declaring a method of
/// that name wins; static imports come last.
fn unqualified_methods(
    lookup: &Lookup<'_, '_>,
    name: &str,
    arity: Option<usize>,
) -> Vec<SelectedElement> {
    let enclosing = lookup.enclosing();
    for (qualified, _) in enclosing.types.iter().rev() {
        let Some(ty) = lookup.ws.find_type_from(lookup.project, qualified.as_str()) else {
            continue;
        };
        let found = methods_named(lookup, &ty, name, arity);
        if !found.is_empty() {
            return found;
        }
    }
    for import in &lookup.unit.imports {
        let ty = match import {
            ImportDecl::StaticSingle { ty, member } if member.as_str() == name => ty,
            ImportDecl::StaticStar { ty } => ty,
            _ => continue,
        };
        let Some(owner) = lookup.ws.find_type_from(lookup.project, ty.as_str()) else {
            continue;
        };
        let found = methods_named(lookup, &owner, name, arity);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// `name` in `@A(name = ...)`.
fn annotation_attribute(
    lookup: &Lookup<'_, '_>,
    src: &Source<'_>,
    idx: usize,
) -> Option<SelectedElement> {
    let previous = src.kind(idx.checked_sub(1)?)?;
    if !src.is(idx + 1, SyntaxKind::Eq)
        || !matches!(previous, SyntaxKind::LParen | SyntaxKind::Comma)
    {
        return None;
    }
    let mut depth = 0usize;
    let open = (0..idx).rev().find(|&i| match src.kind(i) {
        Some(SyntaxKind::RParen) => {
            depth += 1;
            false
        }
        Some(SyntaxKind::LParen) if depth == 0 => true,
        Some(SyntaxKind::LParen) => {
            depth -= 1;
            false
        }
        _ => false,
    })?;
    let (first, _) = dotted_span(src, open.checked_sub(1)?);
    if !src.is(first.checked_sub(1)?, SyntaxKind::At) {
        return None;
    }
    let written = dotted_text(src, first, open - 1);
    let ty = lookup.ws.resolve_type(&lookup.access.scope(), &written)?;
    let method = ty
        .decl
        .methods
        .iter()
        .find(|m| m.name.as_str() == src.text_of(idx))?;
    Some(SelectedElement::AnnotationAttribute {
        owner: ty.name.to_string(),
        name: method.name.to_string(),
    })
}
