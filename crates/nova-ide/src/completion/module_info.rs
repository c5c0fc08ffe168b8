//! Completion inside `module-info.java`.

use std::collections::BTreeSet;

use nova_core::{is_valid_module_name, Visibility};
use nova_modules::ModuleName;
use nova_project::TypeRef;
use nova_syntax::{parse_module_info_lossy, DirectiveName, ModuleDecl};

use super::context::CompletionLocation;
use super::proposal::Candidate;
use super::{Acceptor, Cx};

pub(super) fn collect(cx: &Cx<'_>, acc: &mut Acceptor<'_>) {
    let (decl, _) = parse_module_info_lossy(cx.src.text);
    let own = decl
        .as_ref()
        .map(|decl| ModuleName::new(decl.name.text.clone()))
        .or_else(|| cx.ws.module_of(&cx.project.name).name().cloned());

    match &cx.ctx.location {
        CompletionLocation::ModuleHeader { is_open } => {
            let words: &[&str] = if *is_open {
                &["module"]
            } else {
                &["import", "module", "open"]
            };
            for word in words {
                acc.offer(Candidate::keyword(word));
            }
        }
        CompletionLocation::ModuleName => {
            if is_valid_module_name(&cx.project.name) {
                acc.offer(Candidate::module_declaration(&cx.project.name));
            }
        }
        CompletionLocation::ModuleBody => {
            for directive in DirectiveName::ALL {
                acc.offer(Candidate::keyword(directive.keyword()));
            }
        }
        CompletionLocation::Requires { modifiers } => {
            for word in ["static", "transitive"] {
                if !modifiers.iter().any(|m| m == word) {
                    acc.offer(Candidate::keyword(word));
                }
            }
            requires_candidates(cx, acc, decl.as_ref(), own.as_ref());
        }
        CompletionLocation::ExportsPackage | CompletionLocation::OpensPackage => {
            for package in cx.access.jpms().visible_packages().keys() {
                acc.offer(Candidate::package(package));
            }
        }
        CompletionLocation::ExportsTo | CompletionLocation::OpensTo => {
            acc.offer(Candidate::keyword("to"));
        }
        CompletionLocation::ExportsTarget { listed } | CompletionLocation::OpensTarget { listed } => {
            for module in cx.ws.module_graph().names() {
                if Some(module) == own.as_ref() || listed.iter().any(|l| l == module.as_str()) {
                    continue;
                }
                acc.offer(Candidate::module(module.as_str()));
            }
        }
        CompletionLocation::UsesType | CompletionLocation::ProvidesService => {
            for package in cx.access.jpms().visible_packages().keys() {
                acc.offer(Candidate::package(package));
            }
            for ty in service_types(cx) {
                offer_type(acc, &ty);
            }
        }
        CompletionLocation::ProvidesWith => {
            acc.offer(Candidate::keyword("with"));
        }
        CompletionLocation::ProvidesImplementation { service, listed } => {
            let Some(service) = find_service(cx, service) else {
                tracing::debug!(target: "nova.completion", %service, "unresolved service type");
                return;
            };
            for ty in service_types(cx) {
                if listed.iter().any(|l| l == ty.name.as_str() || l == ty.simple_name()) {
                    continue;
                }
                if cx.access.implements_service(&ty, &service) {
                    offer_type(acc, &ty);
                }
            }
        }
        // Imports preceding the module declaration.
        CompletionLocation::Import { .. } => {
            for package in cx.access.jpms().visible_packages().keys() {
                acc.offer(Candidate::package(package));
            }
            for ty in service_types(cx) {
                let qualifier = ty.name.qualifier();
                let prefix = acc.prefix();
                if let Some((typed, last)) = prefix.rsplit_once('.') {
                    if typed == qualifier {
                        let candidate =
                            Candidate::type_ref(ty.name.as_str(), ty.package(), ty.name.to_string());
                        acc.offer_as(last, ty.simple_name(), candidate);
                    }
                }
            }
        }
        _ => {}
    }
}

fn requires_candidates(
    cx: &Cx<'_>,
    acc: &mut Acceptor<'_>,
    decl: Option<&ModuleDecl>,
    own: Option<&ModuleName>,
) {
    let cursor = cx.ctx.replace.start;
    // The directive under the cursor may itself parse as a complete `requires`.
    let required: BTreeSet<&str> = decl
        .into_iter()
        .flat_map(|decl| decl.requires())
        .filter(|req| usize::from(req.module.range.end()) < cursor)
        .map(|req| req.module.as_str())
        .collect();
    let graph = cx.ws.module_graph();
    for module in cx.access.jpms().build_path_modules() {
        if Some(&module) == own || required.contains(module.as_str()) {
            continue;
        }
        if own.is_some_and(|own| graph.would_create_cycle(own, &module)) {
            tracing::trace!(target: "nova.completion", %module, "skipping module that requires us");
            continue;
        }
        acc.offer(Candidate::module(module.as_str()));
    }
}

/// Types that can be named in a module directive: visible from this module
/// and public along their whole nesting chain.
fn service_types<'a>(cx: &Cx<'a>) -> Vec<TypeRef<'a>> {
    cx.ws
        .types_visible_from(cx.project)
        .filter(|ty| cx.access.jpms().type_is_visible(ty))
        .filter(|ty| publicly_accessible(cx, ty))
        .collect()
}

fn publicly_accessible(cx: &Cx<'_>, ty: &TypeRef<'_>) -> bool {
    if ty.decl.visibility() != Visibility::Public {
        return false;
    }
    match ty.outer().and_then(|outer| cx.ws.find_type_from(ty.project, outer)) {
        Some(outer) => publicly_accessible(cx, &outer),
        None => true,
    }
}

fn find_service<'a>(cx: &Cx<'a>, written: &str) -> Option<TypeRef<'a>> {
    if written.contains('.') {
        return cx.ws.find_type_from(cx.project, written);
    }
    service_types(cx)
        .into_iter()
        .find(|ty| ty.simple_name() == written)
}

/// Directive types are written qualified; a dotted prefix matches the
/// qualified name, a simple one the simple name.
fn offer_type(acc: &mut Acceptor<'_>, ty: &TypeRef<'_>) {
    let candidate = Candidate::type_ref(ty.name.as_str(), ty.package(), ty.name.to_string());
    let prefix = acc.prefix();
    let text = if prefix.contains('.') {
        ty.name.as_str()
    } else {
        ty.simple_name()
    };
    acc.offer_as(prefix, text, candidate);
}
