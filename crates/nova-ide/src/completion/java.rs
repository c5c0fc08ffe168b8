//! Completion in Java compilation units.

use std::collections::BTreeSet;

use nova_hir::{ImportDecl, MemberRef, MethodDecl, TypeKind};
use nova_project::{TypeRef, TypeScope};
use nova_syntax::SyntaxKind;
use nova_types::{TypeArg, TypeSig, PRIMITIVES};

use crate::lookup::Receiver;

use super::context::{CompletionLocation, HeaderClause};
use super::proposal::Candidate;
use super::relevance::{
    R_ANNOTATION, R_CLASS, R_EXACT_EXPECTED_TYPE, R_EXCEPTION, R_EXPECTED_TYPE, R_INTERFACE,
    R_NON_INHERITED, R_NON_STATIC, R_QUALIFIED, R_TRUE_OR_FALSE, R_UNQUALIFIED, R_VOID,
};
use super::{Acceptor, Cx};

const CODE_KEYWORDS: &[&str] = &[
    "assert", "boolean", "break", "byte", "case", "char", "continue", "default", "do", "double",
    "else", "false", "final", "float", "for", "if", "int", "long", "new", "null", "return",
    "short", "super", "switch", "synchronized", "this", "throw", "true", "try", "var", "while",
    "yield",
];

const MEMBER_KEYWORDS: &[&str] = &[
    "abstract", "boolean", "byte", "char", "class", "double", "enum", "final", "float", "int",
    "interface", "long", "native", "private", "protected", "public", "record", "short", "static",
    "synchronized", "transient", "void", "volatile",
];

const TOP_LEVEL_KEYWORDS: &[&str] = &[
    "abstract", "class", "enum", "final", "import", "interface", "package", "public", "record",
    "sealed",
];

pub(super) fn collect(cx: &Cx<'_>, acc: &mut Acceptor<'_>) {
    let scope = cx.access.scope();
    match &cx.ctx.location {
        CompletionLocation::PackageDecl => {
            for package in cx.ws.packages(&cx.project.name) {
                acc.offer(Candidate::package(&package));
            }
        }
        CompletionLocation::Import { is_static } => imports(cx, acc, *is_static),
        CompletionLocation::TypeHeader {
            clause,
            is_interface,
        } => {
            let filter = match clause {
                HeaderClause::Extends if *is_interface => TypeFilter::Interface,
                HeaderClause::Extends => TypeFilter::Class,
                HeaderClause::Implements => TypeFilter::Interface,
                HeaderClause::Permits => TypeFilter::Permitted,
                HeaderClause::Throws => TypeFilter::Throwable,
            };
            types(cx, acc, &scope, filter, None);
        }
        CompletionLocation::Annotation => types(cx, acc, &scope, TypeFilter::Annotation, None),
        CompletionLocation::AnnotationAttribute { annotation, given } => {
            annotation_attributes(cx, acc, &scope, annotation, given);
        }
        CompletionLocation::New => {
            let expected = expected_type(cx, &scope);
            types(cx, acc, &scope, TypeFilter::Instantiable, expected.as_ref());
        }
        CompletionLocation::Catch => types(cx, acc, &scope, TypeFilter::Throwable, None),
        CompletionLocation::MemberAccess { receiver } => member_access(cx, acc, &scope, receiver),
        CompletionLocation::Expression => expression(cx, acc, &scope),
        CompletionLocation::ClassBody => {
            types(cx, acc, &scope, TypeFilter::Any, None);
            keywords(acc, MEMBER_KEYWORDS, None);
        }
        CompletionLocation::TopLevel => keywords(acc, TOP_LEVEL_KEYWORDS, None),
        _ => {}
    }
}

/// Type a completed expression is expected to have.
#[derive(Debug, Clone)]
enum Expected<'a> {
    Primitive(String),
    Type(TypeRef<'a>),
}

impl Expected<'_> {
    fn type_bonus(&self, cx: &Cx<'_>, ty: &TypeRef<'_>) -> i32 {
        match self {
            Expected::Type(expected) if expected.name == ty.name => R_EXACT_EXPECTED_TYPE,
            Expected::Type(expected)
                if cx.ws.is_subtype(ty.name.as_str(), expected.name.as_str()) =>
            {
                R_EXPECTED_TYPE
            }
            _ => 0,
        }
    }

    fn sig_bonus(&self, cx: &Cx<'_>, scope: &TypeScope<'_>, sig: &TypeSig) -> i32 {
        if sig.array_dims > 0 {
            return 0;
        }
        match self {
            Expected::Primitive(name) if sig.name == *name => R_EXACT_EXPECTED_TYPE,
            Expected::Primitive(_) => 0,
            Expected::Type(_) => cx
                .ws
                .resolve_type(scope, &sig.name)
                .map_or(0, |ty| self.type_bonus(cx, &ty)),
        }
    }
}

fn expected_type<'a>(cx: &Cx<'a>, scope: &TypeScope<'_>) -> Option<Expected<'a>> {
    let sig = match &cx.hints.expected_type {
        Some(sig) => sig.clone(),
        None => expected_from_tokens(cx)?,
    };
    if sig.array_dims > 0 || sig.is_void() {
        return None;
    }
    if PRIMITIVES.contains(&sig.name.as_str()) {
        return Some(Expected::Primitive(sig.name));
    }
    cx.ws.resolve_type(scope, &sig.name).map(Expected::Type)
}

/// `T x = <|>`, `x = <|>`, `x = new <|>` and `return <|>`.
fn expected_from_tokens(cx: &Cx<'_>) -> Option<TypeSig> {
    let src = cx.src;
    let mut at = cx.ctx.end.checked_sub(1)?;
    if src.is_word(at, "new") {
        at = at.checked_sub(1)?;
    }
    if src.is(at, SyntaxKind::Eq) {
        let name = src.word(at.checked_sub(1)?)?;
        let lookup = cx.lookup();
        if let Some(ty) = lookup.local(name) {
            return ty;
        }
        return lookup.enclosing_field(name).map(|(_, field)| field.ty.clone());
    }
    if src.is_word(at, "return") {
        if let Some(MemberRef::Method(method)) = cx.lookup().enclosing().member {
            return Some(method.return_type.clone());
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFilter {
    Any,
    Class,
    Interface,
    Annotation,
    Throwable,
    Instantiable,
    Permitted,
}

impl TypeFilter {
    /// The relevance bonus for `ty`, or `None` when it does not fit.
    fn accepts(self, cx: &Cx<'_>, ty: &TypeRef<'_>) -> Option<i32> {
        let kind = ty.decl.kind;
        match self {
            TypeFilter::Any => Some(0),
            TypeFilter::Class => {
                (kind == TypeKind::Class && !ty.decl.modifiers.is_final).then_some(R_CLASS)
            }
            TypeFilter::Interface => (kind == TypeKind::Interface).then_some(R_INTERFACE),
            TypeFilter::Annotation => (kind == TypeKind::Annotation).then_some(R_ANNOTATION),
            TypeFilter::Throwable => ty.is_throwable(cx.ws).then_some(R_EXCEPTION),
            TypeFilter::Instantiable => {
                matches!(kind, TypeKind::Class | TypeKind::Interface | TypeKind::Record)
                    .then_some(0)
            }
            TypeFilter::Permitted => (kind != TypeKind::Annotation).then_some(0),
        }
    }
}

fn types(
    cx: &Cx<'_>,
    acc: &mut Acceptor<'_>,
    scope: &TypeScope<'_>,
    filter: TypeFilter,
    expected: Option<&Expected<'_>>,
) {
    for ty in cx.ws.types_visible_from(cx.project) {
        if !cx.access.type_is_accessible(&ty) {
            continue;
        }
        let Some(mut bonus) = filter.accepts(cx, &ty) else {
            continue;
        };
        let unqualified = cx
            .ws
            .resolve_type(scope, ty.simple_name())
            .is_some_and(|found| found.name == ty.name);
        bonus += if unqualified { R_UNQUALIFIED } else { R_QUALIFIED };
        bonus += expected.map_or(0, |e| e.type_bonus(cx, &ty));
        let completion = if unqualified {
            ty.simple_name().to_string()
        } else {
            ty.name.to_string()
        };
        let candidate = Candidate::type_ref(ty.name.as_str(), ty.package(), completion);
        acc.offer(candidate.with_relevance(bonus));
    }
}

fn keywords(acc: &mut Acceptor<'_>, words: &[&str], expected: Option<&Expected<'_>>) {
    if acc.prefix().is_empty() {
        return;
    }
    let boolean = matches!(expected, Some(Expected::Primitive(name)) if name == "boolean");
    for word in words {
        let mut candidate = Candidate::keyword(word);
        if boolean && matches!(*word, "true" | "false") {
            candidate = candidate.with_relevance(R_TRUE_OR_FALSE);
        }
        acc.offer(candidate);
    }
}

fn imports(cx: &Cx<'_>, acc: &mut Acceptor<'_>, is_static: bool) {
    for package in cx.access.jpms().visible_packages().keys() {
        acc.offer(Candidate::package(package));
    }
    let prefix = acc.prefix();
    let Some((qualifier, last)) = prefix.rsplit_once('.') else {
        return;
    };
    for ty in cx.ws.types_visible_from(cx.project) {
        if ty.name.qualifier() != qualifier || !cx.access.type_is_accessible(&ty) {
            continue;
        }
        let candidate = Candidate::type_ref(ty.name.as_str(), ty.package(), ty.name.to_string());
        acc.offer_as(last, ty.simple_name(), candidate);
    }
    if !is_static {
        return;
    }
    let Some(owner) = cx.ws.find_type_from(cx.project, qualifier) else {
        return;
    };
    if !cx.access.type_is_accessible(&owner) {
        return;
    }
    let scope = TypeScope::inside(&owner);
    let owner_sig = format!("L{};", owner.name);
    for field in owner.decl.fields.iter().filter(|f| f.is_static()) {
        if cx.access.member_is_accessible(&owner, field.modifiers.visibility) {
            let mut candidate = Candidate::field(
                field.name.as_str(),
                owner_sig.clone(),
                signature(cx, &scope, &field.ty),
            );
            candidate.completion = format!("{qualifier}.{}", field.name);
            acc.offer_as(last, field.name.as_str(), candidate);
        }
    }
    for method in owner.decl.methods.iter().filter(|m| m.is_static()) {
        if cx.access.member_is_accessible(&owner, method.modifiers.visibility) {
            let mut candidate = method_candidate(cx, &scope, owner_sig.clone(), method);
            candidate.completion = format!("{qualifier}.{}", method.name);
            acc.offer_as(last, method.name.as_str(), candidate);
        }
    }
}

fn annotation_attributes(
    cx: &Cx<'_>,
    acc: &mut Acceptor<'_>,
    scope: &TypeScope<'_>,
    annotation: &str,
    given: &[String],
) {
    let Some(ty) = cx.ws.resolve_type(scope, annotation) else {
        tracing::debug!(target: "nova.completion", annotation, "unresolved annotation type");
        return;
    };
    if ty.decl.kind != TypeKind::Annotation {
        return;
    }
    let owner_scope = TypeScope::inside(&ty);
    let owner_sig = format!("L{};", ty.name);
    for method in &ty.decl.methods {
        if given.iter().any(|g| g == method.name.as_str()) {
            continue;
        }
        acc.offer(Candidate::annotation_attribute(
            method.name.as_str(),
            owner_sig.clone(),
            signature(cx, &owner_scope, &method.return_type),
        ));
    }
}

fn expression(cx: &Cx<'_>, acc: &mut Acceptor<'_>, scope: &TypeScope<'_>) {
    let expected = expected_type(cx, scope);
    let expected = expected.as_ref();

    let lookup = cx.lookup();
    for (name, ty) in lookup.locals() {
        let mut bonus = R_UNQUALIFIED;
        if let (Some(e), Some(ty)) = (expected, &ty) {
            bonus += e.sig_bonus(cx, scope, ty);
        }
        let signature = ty.as_ref().map(|ty| signature(cx, scope, ty));
        acc.offer(Candidate::local(&name, signature).with_relevance(bonus));
    }

    let enclosing = lookup.enclosing();
    let mut static_context = lookup.is_static_context();
    let mut seen = BTreeSet::new();
    for (name, decl) in enclosing.types.iter().rev() {
        if let Some(owner) = cx.ws.find_type_from(cx.project, name.as_str()) {
            let mode = MemberMode::Unqualified { static_context };
            members(cx, acc, &owner, mode, expected, &mut seen);
        }
        // Outer instance members are out of reach from static nested types.
        static_context |= decl.modifiers.is_static || decl.kind != TypeKind::Class;
    }

    for import in &cx.unit.imports {
        let (ty, member) = match import {
            ImportDecl::StaticSingle { ty, member } => (ty, Some(member.as_str())),
            ImportDecl::StaticStar { ty } => (ty, None),
            _ => continue,
        };
        let Some(owner) = cx.ws.find_type_from(cx.project, ty.as_str()) else {
            continue;
        };
        static_imports(cx, acc, &owner, member, expected, &mut seen);
    }

    types(cx, acc, scope, TypeFilter::Any, expected);
    keywords(acc, CODE_KEYWORDS, expected);
}

#[derive(Debug, Clone, Copy)]
enum MemberMode {
    /// No receiver: members of an enclosing type.
    Unqualified { static_context: bool },
    /// `expr.`
    Instance,
    /// `Type.`
    Static,
}

impl MemberMode {
    fn bonus(self, is_static: bool) -> Option<i32> {
        match self {
            MemberMode::Unqualified {
                static_context: true,
            } => is_static.then_some(R_UNQUALIFIED + R_NON_STATIC),
            MemberMode::Unqualified {
                static_context: false,
            } => Some(R_UNQUALIFIED + if is_static { 0 } else { R_NON_STATIC }),
            MemberMode::Instance => Some(if is_static { 0 } else { R_NON_STATIC }),
            MemberMode::Static => is_static.then_some(R_NON_STATIC),
        }
    }
}

/// Fields and methods of `receiver` and its supertypes. `seen` holds the
/// members already offered, so that overrides and shadowed fields are
/// proposed once.
fn members(
    cx: &Cx<'_>,
    acc: &mut Acceptor<'_>,
    receiver: &TypeRef<'_>,
    mode: MemberMode,
    expected: Option<&Expected<'_>>,
    seen: &mut BTreeSet<String>,
) {
    let mut owners = vec![*receiver];
    owners.extend(cx.ws.supertypes(receiver));
    for owner in owners {
        let inherited = owner.name != receiver.name;
        let scope = TypeScope::inside(&owner);
        let owner_sig = format!("L{};", owner.name);
        for field in &owner.decl.fields {
            if !cx.access.member_is_accessible(&owner, field.modifiers.visibility) {
                continue;
            }
            let Some(mut bonus) = mode.bonus(field.is_static()) else {
                continue;
            };
            if !seen.insert(format!("field {}", field.name)) {
                continue;
            }
            if !inherited {
                bonus += R_NON_INHERITED;
            }
            bonus += expected.map_or(0, |e| e.sig_bonus(cx, &scope, &field.ty));
            let candidate = Candidate::field(
                field.name.as_str(),
                owner_sig.clone(),
                signature(cx, &scope, &field.ty),
            );
            acc.offer(candidate.with_relevance(bonus));
        }
        for method in &owner.decl.methods {
            if !cx.access.member_is_accessible(&owner, method.modifiers.visibility) {
                continue;
            }
            let Some(mut bonus) = mode.bonus(method.is_static()) else {
                continue;
            };
            if !seen.insert(method_key(method)) {
                continue;
            }
            if !inherited {
                bonus += R_NON_INHERITED;
            }
            bonus += method_expected_bonus(cx, &scope, method, expected);
            let candidate = method_candidate(cx, &scope, owner_sig.clone(), method);
            acc.offer(candidate.with_relevance(bonus));
        }
    }
}

fn static_imports(
    cx: &Cx<'_>,
    acc: &mut Acceptor<'_>,
    owner: &TypeRef<'_>,
    member: Option<&str>,
    expected: Option<&Expected<'_>>,
    seen: &mut BTreeSet<String>,
) {
    let wanted = |name: &str| member.map_or(true, |member| member == name);
    let scope = TypeScope::inside(owner);
    let owner_sig = format!("L{};", owner.name);
    for field in &owner.decl.fields {
        if !field.is_static()
            || !wanted(field.name.as_str())
            || !cx.access.member_is_accessible(owner, field.modifiers.visibility)
            || !seen.insert(format!("field {}", field.name))
        {
            continue;
        }
        let bonus = R_UNQUALIFIED
            + R_NON_STATIC
            + expected.map_or(0, |e| e.sig_bonus(cx, &scope, &field.ty));
        let candidate = Candidate::field(
            field.name.as_str(),
            owner_sig.clone(),
            signature(cx, &scope, &field.ty),
        );
        acc.offer(candidate.with_relevance(bonus));
    }
    for method in &owner.decl.methods {
        if !method.is_static()
            || !wanted(method.name.as_str())
            || !cx.access.member_is_accessible(owner, method.modifiers.visibility)
            || !seen.insert(method_key(method))
        {
            continue;
        }
        let bonus = R_UNQUALIFIED + R_NON_STATIC + method_expected_bonus(cx, &scope, method, expected);
        let candidate = method_candidate(cx, &scope, owner_sig.clone(), method);
        acc.offer(candidate.with_relevance(bonus));
    }
}

fn method_key(method: &MethodDecl) -> String {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{}{}", p.ty.simple_name(), "[]".repeat(usize::from(p.ty.array_dims))))
        .collect();
    format!("method {}({})", method.name, params.join(","))
}

fn method_expected_bonus(
    cx: &Cx<'_>,
    scope: &TypeScope<'_>,
    method: &MethodDecl,
    expected: Option<&Expected<'_>>,
) -> i32 {
    match expected {
        Some(_) if method.return_type.is_void() => R_VOID,
        Some(e) => e.sig_bonus(cx, scope, &method.return_type),
        None => 0,
    }
}

fn method_candidate(
    cx: &Cx<'_>,
    scope: &TypeScope<'_>,
    owner_sig: String,
    method: &MethodDecl,
) -> Candidate {
    let params: String = method
        .params
        .iter()
        .map(|p| signature(cx, scope, &p.ty))
        .collect();
    let sig = format!("({params}){}", signature(cx, scope, &method.return_type));
    let names = method
        .params
        .iter()
        .map(|p| p.name.to_string())
        .collect();
    Candidate::method(method.name.as_str(), owner_sig, sig, names)
}

/// `sig` with every resolvable type name replaced by its qualified name.
fn qualify(cx: &Cx<'_>, scope: &TypeScope<'_>, sig: &TypeSig) -> TypeSig {
    let mut out = sig.clone();
    if !PRIMITIVES.contains(&sig.name.as_str()) {
        if let Some(ty) = cx.ws.resolve_type(scope, &sig.name) {
            out.name = ty.name.to_string();
        }
    }
    out.args = sig
        .args
        .iter()
        .map(|arg| match arg {
            TypeArg::Type(ty) => TypeArg::Type(qualify(cx, scope, ty)),
            TypeArg::Extends(ty) => TypeArg::Extends(qualify(cx, scope, ty)),
            TypeArg::Super(ty) => TypeArg::Super(qualify(cx, scope, ty)),
            TypeArg::Wildcard => TypeArg::Wildcard,
        })
        .collect();
    out
}

fn signature(cx: &Cx<'_>, scope: &TypeScope<'_>, sig: &TypeSig) -> String {
    qualify(cx, scope, sig).signature()
}

fn member_access(cx: &Cx<'_>, acc: &mut Acceptor<'_>, scope: &TypeScope<'_>, receiver: &str) {
    let expected = cx
        .hints
        .expected_type
        .as_ref()
        .and_then(|_| expected_type(cx, scope));
    let Some(resolved) = cx.lookup().resolve_receiver(scope, receiver) else {
        tracing::debug!(target: "nova.completion", receiver, "unresolved receiver");
        return;
    };
    let mut seen = BTreeSet::new();
    match resolved {
        Receiver::Instance(ty) => {
            members(cx, acc, &ty, MemberMode::Instance, expected.as_ref(), &mut seen);
        }
        Receiver::Static(ty) => {
            members(cx, acc, &ty, MemberMode::Static, expected.as_ref(), &mut seen);
            for nested in &ty.decl.nested_types {
                let name = format!("{}.{}", ty.name, nested.name);
                let Some(nested) = cx.ws.find_type_from(cx.project, &name) else {
                    continue;
                };
                if cx.access.type_is_accessible(&nested) {
                    let candidate = Candidate::type_ref(
                        nested.name.as_str(),
                        nested.package(),
                        nested.simple_name().to_string(),
                    );
                    acc.offer(candidate);
                }
            }
            keywords(acc, &["class"], None);
        }
        Receiver::Package(package) => {
            for ty in cx.ws.types_visible_from(cx.project) {
                if ty.package() != package || ty.is_nested() || !cx.access.type_is_accessible(&ty)
                {
                    continue;
                }
                let candidate = Candidate::type_ref(
                    ty.name.as_str(),
                    ty.package(),
                    ty.simple_name().to_string(),
                );
                acc.offer(candidate);
            }
            let nested_prefix = format!("{package}.");
            let subpackages: BTreeSet<String> = cx
                .access
                .jpms()
                .visible_packages()
                .into_keys()
                .filter_map(|p| {
                    let rest = p.strip_prefix(&nested_prefix)?;
                    rest.split('.').next().map(str::to_string)
                })
                .collect();
            let prefix = acc.prefix();
            for segment in subpackages {
                let mut candidate = Candidate::package(&format!("{nested_prefix}{segment}"));
                candidate.completion = segment.clone();
                acc.offer_as(prefix, &segment, candidate);
            }
        }
    }
}
