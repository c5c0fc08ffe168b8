use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use nova_core::{TextRange, JAVA_LANG};
use nova_hir::{
    CompilationUnit, ConstructorDecl, FieldDecl, MemberRef, MethodDecl, ParamDecl, Reference,
    ReferenceKind, ReferenceRole, Target,
};
use nova_project::{Project, TypeScope, Workspace};
use nova_modules::ModuleName;
use nova_syntax::{parse_module_info_lossy, ModuleDirective, NameRef};
use nova_types::TypeSig;
use thiserror::Error;

use crate::accuracy::{erasures_equal, type_args_accuracy, MatchAccuracy};
use crate::pattern::{LimitTo, MatchRule, PatternKind, SearchPattern};

pub type RequestorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Receives matches in (path, offset) order.
pub trait SearchRequestor {
    fn accept(&mut self, found: &SearchMatch) -> Result<(), RequestorError>;
}

impl<F> SearchRequestor for F
where
    F: FnMut(&SearchMatch) -> Result<(), RequestorError>,
{
    fn accept(&mut self, found: &SearchMatch) -> Result<(), RequestorError> {
        self(found)
    }
}

impl SearchRequestor for Vec<SearchMatch> {
    fn accept(&mut self, found: &SearchMatch) -> Result<(), RequestorError> {
        self.push(found.clone());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search requestor failed")]
    Requestor {
        #[source]
        source: RequestorError,
    },
}

/// Where to search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    Workspace,
    Projects(Vec<String>),
    Files(Vec<String>),
}

impl SearchScope {
    pub fn contains(&self, project: &Project, path: &str) -> bool {
        match self {
            SearchScope::Workspace => true,
            SearchScope::Projects(names) => names.iter().any(|name| *name == project.name),
            SearchScope::Files(paths) => paths.iter().any(|p| p == path),
        }
    }
}

/// A located occurrence of a searched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: String,
    pub range: TextRange,
    /// Description of the innermost declaration containing the match.
    pub element: Option<String>,
    /// Source text of the match.
    pub snippet: String,
    pub accuracy: MatchAccuracy,
    pub is_declaration: bool,
}

impl fmt::Display for SearchMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(element) = &self.element {
            write!(f, " {element}")?;
        }
        write!(f, " [{}] {}", self.snippet, self.accuracy)
    }
}

pub struct SearchEngine<'a> {
    ws: &'a Workspace,
}

impl<'a> SearchEngine<'a> {
    pub fn new(ws: &'a Workspace) -> Self {
        Self { ws }
    }

    /// Run `pattern` over `scope`, reporting every match to `requestor`.
    ///
    /// Returns the number of matches reported. The first requestor failure
    /// aborts the search.
    pub fn search(
        &self,
        pattern: &SearchPattern,
        scope: &SearchScope,
        requestor: &mut dyn SearchRequestor,
    ) -> Result<usize, SearchError> {
        let matches = self.find_matches(pattern, scope);
        for (idx, found) in matches.iter().enumerate() {
            if let Err(source) = requestor.accept(found) {
                tracing::debug!(target: "nova.search", reported = idx, error = %source, "requestor failed");
                return Err(SearchError::Requestor { source });
            }
        }
        Ok(matches.len())
    }

    /// All matches of `pattern` in `scope`, sorted by path then offset.
    pub fn find_matches(&self, pattern: &SearchPattern, scope: &SearchScope) -> Vec<SearchMatch> {
        let _span = tracing::debug_span!(
            target: "nova.search",
            "search",
            limit_to = ?pattern.limit_to,
            mode = ?pattern.rule.mode
        )
        .entered();

        let mut out = Vec::new();
        for project in self.ws.projects() {
            let mut seen_packages = BTreeSet::new();
            for unit in &project.units {
                if !scope.contains(project, &unit.path) {
                    continue;
                }
                let mut collector = Collector {
                    engine: self,
                    pattern,
                    project,
                    unit,
                    text: self.ws.file_text(&unit.path),
                    out: &mut out,
                };
                if pattern.limit_to.includes_declarations() {
                    collector.declarations(&mut seen_packages);
                }
                match pattern.limit_to {
                    LimitTo::Declarations => {}
                    LimitTo::Implementors => collector.implementors(),
                    _ if project.is_source() => collector.references(),
                    _ => {}
                }
            }

            if let Some(path) = project.module_info_path() {
                if scope.contains(project, path) {
                    self.module_info_matches(pattern, project, path, &mut out);
                }
            }
        }

        out.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then(a.range.start().cmp(&b.range.start()))
                .then(a.range.end().cmp(&b.range.end()))
                .then(b.is_declaration.cmp(&a.is_declaration))
                .then(a.element.cmp(&b.element))
        });
        // Declarations without a name range all sit at 0..0; only the same
        // element at the same place is a duplicate.
        out.dedup_by(|a, b| {
            a.path == b.path
                && a.range == b.range
                && a.element == b.element
                && a.is_declaration == b.is_declaration
        });
        tracing::debug!(target: "nova.search", matches = out.len(), "search finished");
        out
    }

    /// Qualify a written type name for subtype checks.
    ///
    /// Names are resolved in `scope` when one is known, then as qualified
    /// names and `java.lang` members. A bare simple name outside any scope
    /// only resolves when exactly one workspace type carries it.
    fn qualify(&self, scope: Option<&TypeScope<'_>>, name: &str) -> Option<String> {
        if let Some(ty) = scope.and_then(|scope| self.ws.resolve_type(scope, name)) {
            return Some(ty.name.to_string());
        }
        if let Some(ty) = self.ws.find_type(name) {
            return Some(ty.name.to_string());
        }
        if let Some(ty) = self.ws.find_type(&format!("{JAVA_LANG}.{name}")) {
            return Some(ty.name.to_string());
        }
        let mut candidates = self.ws.all_types().filter(|ty| ty.simple_name() == name);
        match (candidates.next(), candidates.next()) {
            (Some(ty), None) => Some(ty.name.to_string()),
            _ => None,
        }
    }

    fn loose_is_subtype(&self, scope: Option<&TypeScope<'_>>, sub: &str, sup: &str) -> bool {
        match (self.qualify(scope, sub), self.qualify(scope, sup)) {
            (Some(sub), Some(sup)) => self.ws.is_subtype(&sub, &sup),
            _ => false,
        }
    }

    fn is_generic_type(&self, name: &str) -> bool {
        self.ws.find_type(name).is_some_and(|ty| ty.decl.is_generic())
    }

    /// Whether `owner` matches `declaring`, directly or through a supertype.
    fn owner_matches(&self, rule: &MatchRule, declaring: &str, owner: &str) -> bool {
        if rule.matches_qualified(declaring, owner) {
            return true;
        }
        let Some(ty) = self.ws.find_type(owner) else {
            return false;
        };
        self.ws
            .supertypes(&ty)
            .iter()
            .any(|sup| rule.matches_qualified(declaring, sup.name.as_str()))
    }

    fn module_info_matches(
        &self,
        pattern: &SearchPattern,
        project: &Project,
        path: &str,
        out: &mut Vec<SearchMatch>,
    ) {
        let Some(text) = project.files.get(path) else {
            return;
        };
        let (Some(decl), _) = parse_module_info_lossy(text) else {
            return;
        };
        let rule = &pattern.rule;
        let element = Some(decl.name.text.clone());
        let wants_references = matches!(
            pattern.limit_to,
            LimitTo::References | LimitTo::AllOccurrences | LimitTo::ReadAccesses
        );
        let mut push = |name: &NameRef, accuracy: MatchAccuracy, is_declaration: bool| {
            out.push(SearchMatch {
                path: path.to_string(),
                range: name.range,
                element: element.clone(),
                snippet: name.text.clone(),
                accuracy,
                is_declaration,
            });
        };

        match &pattern.kind {
            PatternKind::Module { name } => {
                if pattern.limit_to.includes_declarations() && rule.matches(name, &decl.name.text) {
                    push(&decl.name, MatchAccuracy::EXACT, true);
                }
                if !wants_references {
                    return;
                }
                let targets = decl
                    .requires()
                    .map(|r| &r.module)
                    .chain(decl.exports().chain(decl.opens()).flat_map(|e| e.to.iter()));
                for target in targets {
                    if rule.matches(name, &target.text) {
                        let known = self
                            .ws
                            .module_graph()
                            .contains(&ModuleName::new(target.text.as_str()));
                        let accuracy = if known {
                            MatchAccuracy::EXACT
                        } else {
                            MatchAccuracy::POTENTIAL
                        };
                        push(target, accuracy, false);
                    }
                }
            }
            PatternKind::Package { name } if wants_references => {
                let packages = self.ws.packages(&project.name);
                for exported in decl.exports().chain(decl.opens()) {
                    if rule.matches(name, &exported.package.text) {
                        let accuracy = if packages.contains(&exported.package.text) {
                            MatchAccuracy::EXACT
                        } else {
                            MatchAccuracy::POTENTIAL
                        };
                        push(&exported.package, accuracy, false);
                    }
                }
            }
            PatternKind::Type { name, type_args } if wants_references => {
                let services = decl.directives.iter().flat_map(|d| match d {
                    ModuleDirective::Uses(u) => vec![&u.service],
                    ModuleDirective::Provides(p) => {
                        std::iter::once(&p.service).chain(&p.implementations).collect()
                    }
                    _ => Vec::new(),
                });
                for written in services {
                    let accuracy = match self.ws.find_type_from(project, &written.text) {
                        Some(ty) if rule.matches_qualified(name, ty.name.as_str()) => {
                            type_args_accuracy(
                                type_args,
                                &[],
                                ty.decl.is_generic(),
                                rule,
                                &|a: &str, b: &str| self.loose_is_subtype(None, a, b),
                            )
                        }
                        Some(_) => None,
                        None => written_name_matches(rule, name, &written.text)
                            .then_some(MatchAccuracy::POTENTIAL),
                    };
                    if let Some(accuracy) = accuracy {
                        push(written, accuracy, false);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Match a pattern name against a name as written in source, which may be
/// qualified or simple.
fn written_name_matches(rule: &MatchRule, pattern: &str, written: &str) -> bool {
    let (pattern_qualifier, pattern_name) = pattern.rsplit_once('.').unwrap_or(("", pattern));
    let (written_qualifier, written_name) = written.rsplit_once('.').unwrap_or(("", written));
    rule.matches(pattern_name, written_name)
        && (pattern_qualifier.is_empty()
            || written_qualifier.is_empty()
            || rule.matches(pattern_qualifier, written_qualifier))
}

fn params_match(pattern: &Option<Vec<TypeSig>>, params: &[ParamDecl]) -> bool {
    match pattern {
        None => true,
        Some(expected) => {
            expected.len() == params.len()
                && expected
                    .iter()
                    .zip(params)
                    .all(|(e, p)| erasures_equal(e, &p.ty))
        }
    }
}

fn sigs_match(pattern: &Option<Vec<TypeSig>>, params: &[TypeSig]) -> bool {
    match pattern {
        None => true,
        Some(expected) => {
            expected.len() == params.len()
                && expected.iter().zip(params).all(|(e, p)| erasures_equal(e, p))
        }
    }
}

fn join_types(params: &[ParamDecl]) -> String {
    params
        .iter()
        .map(|p| p.ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn method_descriptor(owner: &str, method: &MethodDecl) -> String {
    format!(
        "{} {owner}.{}({})",
        method.return_type,
        method.name,
        join_types(&method.params)
    )
}

pub(crate) fn constructor_descriptor(owner: &str, ctor: &ConstructorDecl) -> String {
    format!("{owner}({})", join_types(&ctor.params))
}

pub(crate) fn field_descriptor(owner: &str, field: &FieldDecl) -> String {
    format!("{owner}.{}", field.name)
}

/// Matching within one compilation unit.
struct Collector<'e, 'a> {
    engine: &'e SearchEngine<'a>,
    pattern: &'e SearchPattern,
    project: &'a Project,
    unit: &'a CompilationUnit,
    text: Option<&'a str>,
    out: &'e mut Vec<SearchMatch>,
}

impl<'e, 'a> Collector<'e, 'a> {
    fn rule(&self) -> &MatchRule {
        &self.pattern.rule
    }

    fn snippet(&self, range: Option<TextRange>, fallback: &str) -> String {
        range
            .and_then(|range| self.text?.get(Range::<usize>::from(range)))
            .unwrap_or(fallback)
            .to_string()
    }

    fn push_declaration(&mut self, range: Option<TextRange>, name: &str, element: String) {
        let snippet = self.snippet(range, name);
        self.out.push(SearchMatch {
            path: self.unit.path.clone(),
            range: range.unwrap_or_default(),
            element: Some(element),
            snippet,
            accuracy: MatchAccuracy::EXACT,
            is_declaration: true,
        });
    }

    fn declarations(&mut self, seen_packages: &mut BTreeSet<String>) {
        let pattern = self.pattern;
        let unit = self.unit;
        let rule = pattern.rule;
        match &pattern.kind {
            PatternKind::Type { name, .. } => {
                for (qualified, ty) in unit.all_types() {
                    if rule.matches_qualified(name, qualified.as_str()) {
                        self.push_declaration(ty.name_range, ty.name.as_str(), qualified.to_string());
                    }
                }
            }
            PatternKind::Method {
                declaring_type,
                name,
                params,
                ..
            } => {
                for (qualified, ty) in unit.all_types() {
                    if !declaring_type
                        .as_deref()
                        .map_or(true, |d| rule.matches_qualified(d, qualified.as_str()))
                    {
                        continue;
                    }
                    for method in &ty.methods {
                        if rule.matches(name, method.name.as_str()) && params_match(params, &method.params) {
                            let element = method_descriptor(qualified.as_str(), method);
                            self.push_declaration(method.name_range, method.name.as_str(), element);
                        }
                    }
                }
            }
            PatternKind::Constructor {
                declaring_type,
                params,
                ..
            } => {
                for (qualified, ty) in unit.all_types() {
                    if !rule.matches_qualified(declaring_type, qualified.as_str()) {
                        continue;
                    }
                    for ctor in &ty.constructors {
                        if params_match(params, &ctor.params) {
                            let element = constructor_descriptor(qualified.as_str(), ctor);
                            self.push_declaration(ctor.name_range, ty.name.as_str(), element);
                        }
                    }
                }
            }
            PatternKind::Field {
                declaring_type,
                name,
            } => {
                for (qualified, ty) in unit.all_types() {
                    if !declaring_type
                        .as_deref()
                        .map_or(true, |d| rule.matches_qualified(d, qualified.as_str()))
                    {
                        continue;
                    }
                    for field in &ty.fields {
                        if rule.matches(name, field.name.as_str()) {
                            let element = field_descriptor(qualified.as_str(), field);
                            self.push_declaration(field.name_range, field.name.as_str(), element);
                        }
                    }
                }
            }
            PatternKind::Package { name } => {
                let Some(package) = &unit.package else {
                    return;
                };
                if rule.matches(name, package.as_str()) && seen_packages.insert(package.to_string()) {
                    let snippet = self.snippet(self.unit.package_range, package.as_str());
                    self.out.push(SearchMatch {
                        path: self.unit.path.clone(),
                        range: self.unit.package_range.unwrap_or_default(),
                        element: None,
                        snippet,
                        accuracy: MatchAccuracy::EXACT,
                        is_declaration: true,
                    });
                }
            }
            PatternKind::Module { .. } => {}
        }
    }

    /// Types directly extending or implementing a matching type, and methods
    /// overriding a matching method.
    fn implementors(&mut self) {
        let ws = self.engine.ws;
        let pattern = self.pattern;
        let unit = self.unit;
        let rule = pattern.rule;
        for (qualified, decl) in unit.all_types() {
            let Some(ty) = ws.find_type_from(self.project, qualified.as_str()) else {
                continue;
            };
            match &pattern.kind {
                PatternKind::Type { name, .. } => {
                    let scope = TypeScope::inside(&ty);
                    let accuracy = decl.supertypes().find_map(|sig| {
                        match ws.resolve_type(&scope, &sig.name) {
                            Some(sup) => rule
                                .matches_qualified(name, sup.name.as_str())
                                .then_some(MatchAccuracy::EXACT),
                            None => written_name_matches(&rule, name, &sig.name)
                                .then_some(MatchAccuracy::POTENTIAL),
                        }
                    });
                    if let Some(accuracy) = accuracy {
                        let snippet = self.snippet(decl.name_range, decl.name.as_str());
                        self.out.push(SearchMatch {
                            path: self.unit.path.clone(),
                            range: decl.name_range.unwrap_or_default(),
                            element: Some(qualified.to_string()),
                            snippet,
                            accuracy,
                            is_declaration: true,
                        });
                    }
                }
                PatternKind::Method {
                    declaring_type: Some(declaring),
                    name,
                    params,
                    ..
                } => {
                    let overrides = ws
                        .supertypes(&ty)
                        .iter()
                        .any(|sup| rule.matches_qualified(declaring, sup.name.as_str()));
                    if !overrides {
                        continue;
                    }
                    for method in &decl.methods {
                        if rule.matches(name, method.name.as_str()) && params_match(params, &method.params) {
                            let element = method_descriptor(qualified.as_str(), method);
                            self.push_declaration(method.name_range, method.name.as_str(), element);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn references(&mut self) {
        let limit_to = self.pattern.limit_to;
        let is_field_pattern = matches!(self.pattern.kind, PatternKind::Field { .. });
        let unit = self.unit;
        for reference in &unit.references {
            let role_ok = match limit_to {
                LimitTo::SupertypeTypeReference => reference.role == ReferenceRole::Supertype,
                LimitTo::PermittypeTypeReference => reference.role == ReferenceRole::Permits,
                LimitTo::ReadAccesses if is_field_pattern => reference.access.is_read(),
                LimitTo::WriteAccesses if is_field_pattern => reference.access.is_write(),
                LimitTo::WriteAccesses => false,
                _ => true,
            };
            if !role_ok {
                continue;
            }
            let Some(accuracy) = self.reference_accuracy(reference) else {
                continue;
            };
            let snippet = self.snippet(Some(reference.range), &reference.name);
            let element = self.describe_enclosing(reference.range);
            self.out.push(SearchMatch {
                path: self.unit.path.clone(),
                range: reference.range,
                element,
                snippet,
                accuracy,
                is_declaration: false,
            });
        }
    }

    fn describe_enclosing(&self, range: TextRange) -> Option<String> {
        if self.unit.is_module_info() {
            return self
                .engine
                .ws
                .module_of(&self.project.name)
                .name()
                .map(ToString::to_string);
        }
        let enclosing = self.unit.enclosing(range.start());
        let (owner, _) = enclosing.innermost_type()?;
        Some(match enclosing.member {
            Some(MemberRef::Method(method)) => method_descriptor(owner.as_str(), method),
            Some(MemberRef::Constructor(ctor)) => constructor_descriptor(owner.as_str(), ctor),
            Some(MemberRef::Field(field)) => field_descriptor(owner.as_str(), field),
            None => owner.to_string(),
        })
    }

    fn reference_accuracy(&self, reference: &Reference) -> Option<MatchAccuracy> {
        let engine = self.engine;
        let rule = self.rule();
        let scope = TypeScope::at(self.project, self.unit, reference.range.start());
        let subtype = |a: &str, b: &str| engine.loose_is_subtype(Some(&scope), a, b);
        match (&self.pattern.kind, reference.kind) {
            (PatternKind::Type { name, type_args }, ReferenceKind::Type) => match &reference.target {
                Some(Target::Type { name: target }) => {
                    if !rule.matches_qualified(name, target.as_str()) {
                        return None;
                    }
                    let generic = engine.is_generic_type(target.as_str());
                    type_args_accuracy(type_args, &reference.type_args, generic, rule, &subtype)
                }
                Some(_) => None,
                None => written_name_matches(rule, name, &reference.name)
                    .then_some(MatchAccuracy::POTENTIAL),
            },
            (
                PatternKind::Method {
                    declaring_type,
                    name,
                    params,
                    type_args,
                },
                ReferenceKind::Method,
            ) => match &reference.target {
                Some(Target::Method {
                    owner,
                    name: target_name,
                    params: target_params,
                }) => {
                    let owner_ok = declaring_type
                        .as_deref()
                        .map_or(true, |d| engine.owner_matches(rule, d, owner.as_str()));
                    if !owner_ok || !rule.matches(name, target_name) || !sigs_match(params, target_params) {
                        return None;
                    }
                    let generic = engine
                        .ws
                        .find_type(owner.as_str())
                        .and_then(|ty| {
                            ty.decl.methods.iter().find(|m| {
                                m.name.as_str() == target_name && m.params.len() == target_params.len()
                            })
                        })
                        .is_some_and(|m| !m.type_params.is_empty());
                    type_args_accuracy(type_args, &reference.method_type_args, generic, rule, &subtype)
                }
                Some(_) => None,
                None => {
                    let arity_ok = match (params, reference.arity) {
                        (Some(params), Some(arity)) => params.len() == arity,
                        _ => true,
                    };
                    (arity_ok && rule.matches(name, reference.simple_name()))
                        .then_some(MatchAccuracy::POTENTIAL)
                }
            },
            (
                PatternKind::Constructor {
                    declaring_type,
                    type_args,
                    params,
                    method_type_args,
                },
                ReferenceKind::Constructor,
            ) => match &reference.target {
                Some(Target::Constructor {
                    owner,
                    params: target_params,
                }) => {
                    if !rule.matches_qualified(declaring_type, owner.as_str())
                        || !sigs_match(params, target_params)
                    {
                        return None;
                    }
                    let ty = engine.ws.find_type(owner.as_str());
                    let generic_type = ty.is_some_and(|ty| ty.decl.is_generic());
                    let generic_ctor = ty
                        .and_then(|ty| {
                            ty.decl
                                .constructors
                                .iter()
                                .find(|c| c.params.len() == target_params.len())
                        })
                        .is_some_and(|c| !c.type_params.is_empty());
                    let class = type_args_accuracy(type_args, &reference.type_args, generic_type, rule, &subtype)?;
                    let method = type_args_accuracy(
                        method_type_args,
                        &reference.method_type_args,
                        generic_ctor,
                        rule,
                        &subtype,
                    )?;
                    Some(class.combine(method))
                }
                Some(_) => None,
                None => written_name_matches(rule, declaring_type, &reference.name)
                    .then_some(MatchAccuracy::POTENTIAL),
            },
            (
                PatternKind::Field {
                    declaring_type,
                    name,
                },
                ReferenceKind::Field,
            ) => match &reference.target {
                Some(Target::Field {
                    owner,
                    name: target_name,
                }) => {
                    let owner_ok = declaring_type
                        .as_deref()
                        .map_or(true, |d| engine.owner_matches(rule, d, owner.as_str()));
                    (owner_ok && rule.matches(name, target_name)).then_some(MatchAccuracy::EXACT)
                }
                Some(_) => None,
                None => rule
                    .matches(name, reference.simple_name())
                    .then_some(MatchAccuracy::POTENTIAL),
            },
            (PatternKind::Package { name }, ReferenceKind::Package) => match &reference.target {
                Some(Target::Package { name: target }) => {
                    rule.matches(name, target.as_str()).then_some(MatchAccuracy::EXACT)
                }
                Some(_) => None,
                None => rule
                    .matches(name, &reference.name)
                    .then_some(MatchAccuracy::POTENTIAL),
            },
            (PatternKind::Module { name }, ReferenceKind::Module) => match &reference.target {
                Some(Target::Module { name: target }) => {
                    rule.matches(name, target).then_some(MatchAccuracy::EXACT)
                }
                Some(_) => None,
                None => rule
                    .matches(name, &reference.name)
                    .then_some(MatchAccuracy::POTENTIAL),
            },
            _ => None,
        }
    }
}

