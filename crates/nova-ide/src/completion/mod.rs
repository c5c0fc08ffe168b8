//! Code completion.
//!
//! A request is answered in four steps:
//! 1. the tokens before the cursor classify the position
//!    ([`CompletionLocation`](context::CompletionLocation)),
//! 2. the collector for that position offers candidates, already filtered
//!    by module visibility and Java access control,
//! 3. candidates whose name matches the typed prefix get a relevance
//!    ([`relevance`]),
//! 4. [`rank`] dedups and orders them.
//!
//! Completion never fails: malformed or unknown input yields fewer (or no)
//! proposals.

mod context;
mod java;
mod module_info;
mod proposal;
pub mod relevance;

use std::borrow::Cow;

use nova_core::{Name, QualifiedName, TextSize};
use nova_fuzzy::{match_name, MatchOptions};
use nova_hir::{CompilationUnit, ImportDecl};
use nova_project::{Project, Workspace};
use nova_resolve::AccessContext;
use nova_syntax::SyntaxKind;
use nova_types::TypeSig;
use serde::{Deserialize, Serialize};

use crate::lookup::Lookup;
use crate::text::{clamp_offset, text_range, Source};
use context::CompletionContext;
use proposal::Candidate;

pub use proposal::{rank, CompletionKind, Proposal};

/// Facts about the completion scope supplied by the caller. They take
/// precedence over what completion recovers from the buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeHints {
    pub expected_type: Option<TypeSig>,
    /// Extra locals in scope, as `(name, type)`.
    pub locals: Vec<(String, TypeSig)>,
    pub is_static: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub path: String,
    /// Byte offset of the cursor in the file text.
    pub offset: usize,
    pub options: MatchOptions,
    pub hints: ScopeHints,
    pub max_results: Option<usize>,
}

impl CompletionRequest {
    pub fn new(path: impl Into<String>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
            options: MatchOptions::default(),
            hints: ScopeHints::default(),
            max_results: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: ScopeHints) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// Complete at `request.offset` in `request.path`, using the file text
/// currently held by the workspace.
pub fn complete(ws: &Workspace, request: &CompletionRequest) -> Vec<Proposal> {
    let _span = tracing::debug_span!(
        target: "nova.completion",
        "complete",
        path = %request.path,
        offset = request.offset
    )
    .entered();

    let Some(text) = ws.file_text(&request.path) else {
        tracing::debug!(target: "nova.completion", "no text for file");
        return Vec::new();
    };
    let src = Source::new(text);
    let offset = clamp_offset(text, request.offset);

    let (project, unit) = match ws.unit(&request.path) {
        Some((project, unit)) => (project, Cow::Borrowed(unit)),
        None => {
            let Some(project) = ws.project_of_file(&request.path) else {
                tracing::debug!(target: "nova.completion", "file not in any project");
                return Vec::new();
            };
            (project, Cow::Owned(unit_from_tokens(&request.path, &src)))
        }
    };
    let module_info = request.path.ends_with("module-info.java");
    let ctx = context::analyze(&src, offset, module_info);
    tracing::trace!(
        target: "nova.completion",
        location = ?ctx.location,
        prefix = %ctx.prefix,
        "classified"
    );

    let cx = Cx {
        ws,
        project,
        access: AccessContext::new(ws, project, &unit, TextSize::from(offset as u32)),
        unit: &unit,
        src: &src,
        ctx: &ctx,
        hints: &request.hints,
        offset,
    };
    let mut acc = Acceptor::new(&ctx, &request.options);
    if module_info {
        module_info::collect(&cx, &mut acc);
    } else {
        java::collect(&cx, &mut acc);
    }

    let mut proposals = rank(acc.proposals);
    if let Some(max) = request.max_results {
        proposals.truncate(max);
    }
    tracing::debug!(target: "nova.completion", count = proposals.len(), "completed");
    proposals
}

/// Everything a collector needs to know about the request.
pub(crate) struct Cx<'a> {
    pub ws: &'a Workspace,
    pub project: &'a Project,
    pub unit: &'a CompilationUnit,
    pub access: AccessContext<'a>,
    pub src: &'a Source<'a>,
    pub ctx: &'a CompletionContext,
    pub hints: &'a ScopeHints,
    pub offset: usize,
}

impl<'a> Cx<'a> {
    pub fn lookup(&self) -> Lookup<'a, '_> {
        Lookup {
            ws: self.ws,
            project: self.project,
            unit: self.unit,
            access: &self.access,
            structure: &self.ctx.structure,
            hints: self.hints,
            offset: TextSize::from(self.offset as u32),
        }
    }
}

/// Matches candidates against the prefix and keeps the ones that match.
pub(crate) struct Acceptor<'a> {
    prefix: &'a str,
    options: &'a MatchOptions,
    replace: nova_core::TextRange,
    proposals: Vec<Proposal>,
}

impl<'a> Acceptor<'a> {
    fn new(ctx: &'a CompletionContext, options: &'a MatchOptions) -> Self {
        Self {
            prefix: &ctx.prefix,
            options,
            replace: text_range(ctx.replace.clone()),
            proposals: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// Offer `candidate`, matching the prefix against its name.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let name = candidate.name.clone();
        self.offer_as(self.prefix, &name, candidate)
    }

    /// Offer `candidate`, matching `prefix` against `text`.
    pub fn offer_as(&mut self, prefix: &str, text: &str, candidate: Candidate) -> bool {
        let Some(m) = match_name(prefix, text, self.options) else {
            return false;
        };
        let relevance = relevance::BASE + relevance::name_match(m) + candidate.relevance;
        self.proposals.push(candidate.finish(relevance, self.replace));
        true
    }
}

/// Package and imports of a buffer the declaration model knows nothing about.
pub(crate) fn unit_from_tokens(path: &str, src: &Source<'_>) -> CompilationUnit {
    let mut unit = CompilationUnit::new(path, None);
    let mut idx = 0;
    while idx < src.len() {
        let stop = (idx..src.len())
            .find(|&i| matches!(src.kind(i), Some(SyntaxKind::Semicolon | SyntaxKind::LBrace)))
            .unwrap_or(src.len());
        if src.is(stop, SyntaxKind::LBrace) {
            break;
        }
        match src.word(idx) {
            Some("package") => {
                unit.package = Some(QualifiedName::from_dotted(compact(src.span_text(idx + 1, stop))));
            }
            Some("import") => {
                let is_static = src.is_word(idx + 1, "static");
                let first = if is_static { idx + 2 } else { idx + 1 };
                if let Some(import) = import_decl(&compact(src.span_text(first, stop)), is_static) {
                    unit.imports.push(import);
                }
            }
            _ => {}
        }
        idx = stop + 1;
    }
    unit
}

fn import_decl(text: &str, is_static: bool) -> Option<ImportDecl> {
    let (qualifier, last) = text.rsplit_once('.')?;
    let qualifier = QualifiedName::from_dotted(qualifier);
    Some(match (is_static, last) {
        (false, "*") => ImportDecl::TypeStar { package: qualifier },
        (false, _) => ImportDecl::single(text),
        (true, "*") => ImportDecl::StaticStar { ty: qualifier },
        (true, member) => ImportDecl::StaticSingle {
            ty: qualifier,
            member: Name::new(member),
        },
    })
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
