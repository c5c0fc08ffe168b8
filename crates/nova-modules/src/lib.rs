//! Java Platform Module System (JPMS) model.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use nova_syntax::{ModuleDecl, ModuleDirective};
use serde::{Deserialize, Serialize};

pub const JAVA_BASE: &str = "java.base";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_java_base(&self) -> bool {
        self.0 == JAVA_BASE
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModuleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The module a compilation unit belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Named(ModuleName),
    /// Classpath code.
    Unnamed,
}

impl ModuleKind {
    pub fn name(&self) -> Option<&ModuleName> {
        match self {
            ModuleKind::Named(name) => Some(name),
            ModuleKind::Unnamed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: ModuleName,
    pub is_open: bool,
    pub requires: Vec<Requires>,
    pub exports: Vec<Exports>,
    pub opens: Vec<Opens>,
    pub uses: Vec<Uses>,
    pub provides: Vec<Provides>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: ModuleName::new(name),
            is_open: false,
            requires: Vec::new(),
            exports: Vec::new(),
            opens: Vec::new(),
            uses: Vec::new(),
            provides: Vec::new(),
        }
    }

    /// Lower a parsed `module-info.java` declaration.
    pub fn from_decl(decl: &ModuleDecl) -> Self {
        let mut info = ModuleInfo::new(decl.name.as_str());
        info.is_open = decl.is_open;
        for directive in &decl.directives {
            match directive {
                ModuleDirective::Requires(it) => info.requires.push(Requires {
                    module: ModuleName::new(it.module.as_str()),
                    is_transitive: it.is_transitive,
                    is_static: it.is_static,
                }),
                ModuleDirective::Exports(it) => info.exports.push(Exports {
                    package: it.package.text.clone(),
                    to: it.to.iter().map(|m| ModuleName::new(m.as_str())).collect(),
                }),
                ModuleDirective::Opens(it) => info.opens.push(Opens {
                    package: it.package.text.clone(),
                    to: it.to.iter().map(|m| ModuleName::new(m.as_str())).collect(),
                }),
                ModuleDirective::Uses(it) => info.uses.push(Uses {
                    service: it.service.text.clone(),
                }),
                ModuleDirective::Provides(it) => info.provides.push(Provides {
                    service: it.service.text.clone(),
                    implementations: it
                        .implementations
                        .iter()
                        .map(|i| i.text.clone())
                        .collect(),
                }),
            }
        }
        info
    }

    pub fn requires_module(mut self, module: &str) -> Self {
        self.requires.push(Requires::new(module));
        self
    }

    pub fn requires_transitive(mut self, module: &str) -> Self {
        let mut requires = Requires::new(module);
        requires.is_transitive = true;
        self.requires.push(requires);
        self
    }

    pub fn exports_package(mut self, package: &str) -> Self {
        self.exports.push(Exports {
            package: package.to_string(),
            to: Vec::new(),
        });
        self
    }

    pub fn exports_package_qualified(mut self, package: &str, to: &[&str]) -> Self {
        self.exports.push(Exports {
            package: package.to_string(),
            to: to.iter().map(|m| ModuleName::new(*m)).collect(),
        });
        self
    }

    /// Whether `package` is exported to the named module `to`.
    ///
    /// A module always sees its own packages.
    pub fn exports_package_to(&self, package: &str, to: &ModuleName) -> bool {
        if &self.name == to {
            return true;
        }

        self.exports.iter().any(|exports| {
            exports.package == package
                && (exports.to.is_empty() || exports.to.iter().any(|m| m == to))
        })
    }

    /// Whether `package` is exported without qualification.
    pub fn exports_package_unqualified(&self, package: &str) -> bool {
        self.exports
            .iter()
            .any(|exports| exports.package == package && exports.to.is_empty())
    }

    pub fn exports_package_to_kind(&self, package: &str, to: &ModuleKind) -> bool {
        match to {
            ModuleKind::Named(name) => self.exports_package_to(package, name),
            ModuleKind::Unnamed => self.exports_package_unqualified(package),
        }
    }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requires {
    pub module: ModuleName,
    pub is_transitive: bool,
    pub is_static: bool,
}

impl Requires {
    pub fn new(module: &str) -> Self {
        Self {
            module: ModuleName::new(module),
            is_transitive: false,
            is_static: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exports {
    pub package: String,
    pub to: Vec<ModuleName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opens {
    pub package: String,
    pub to: Vec<ModuleName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uses {
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provides {
    pub service: String,
    pub implementations: Vec<String>,
}

/// Workspace-level representation of named modules.
///
/// Iteration order is by module name so that every query is deterministic.
/// Cyclic `requires` graphs are tolerated: traversals track visited nodes.
#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    modules: BTreeMap<ModuleName, ModuleInfo>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: ModuleInfo) {
        if self.modules.contains_key(&info.name) {
            tracing::debug!(target: "nova.modules", module = %info.name, "replacing module declaration");
        }
        self.modules.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &ModuleName) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.modules.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleName, &ModuleInfo)> {
        self.modules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules.keys()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Compute the set of modules readable by `from`.
    ///
    /// This is a best-effort approximation of JPMS readability:
    /// * A module can always read itself
    /// * `java.base` is implicitly readable
    /// * Direct `requires` edges are readable
    /// * Only `requires transitive` edges of dependencies are propagated
    pub fn readable_modules(&self, from: &ModuleName) -> BTreeSet<ModuleName> {
        let mut out = BTreeSet::new();
        out.insert(from.clone());
        out.insert(ModuleName::new(JAVA_BASE));

        let mut queue = VecDeque::new();
        queue.push_back(from.clone());

        while let Some(current) = queue.pop_front() {
            let Some(info) = self.get(&current) else {
                continue;
            };

            let follow_all = current == *from;
            for req in &info.requires {
                if !follow_all && !req.is_transitive {
                    continue;
                }
                let dep = req.module.clone();
                if out.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }

        out
    }

    pub fn can_read(&self, from: &ModuleName, to: &ModuleName) -> bool {
        if from == to || to.is_java_base() {
            return true;
        }
        self.readable_modules(from).contains(to)
    }

    /// Every module reachable from `from` through `requires` edges of any
    /// kind, excluding `from` itself unless it sits on a cycle.
    pub fn requires_closure(&self, from: &ModuleName) -> BTreeSet<ModuleName> {
        let mut out = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(from.clone());

        while let Some(current) = queue.pop_front() {
            let Some(info) = self.get(&current) else {
                continue;
            };
            for req in &info.requires {
                if out.insert(req.module.clone()) {
                    queue.push_back(req.module.clone());
                }
            }
        }

        out
    }

    /// Whether adding `requires to` to module `from` would close a cycle.
    pub fn would_create_cycle(&self, from: &ModuleName, to: &ModuleName) -> bool {
        from == to || self.requires_closure(to).contains(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_syntax::parse_module_info;
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s)
    }

    #[test]
    fn lowers_parsed_declaration() {
        let decl = parse_module_info(
            "open module a { requires transitive b; exports p to c; opens q; uses S; provides S with I; }",
        )
        .unwrap();
        let info = ModuleInfo::from_decl(&decl);
        assert!(info.is_open);
        assert!(info.requires[0].is_transitive);
        assert_eq!(info.exports[0].to, vec![name("c")]);
        assert_eq!(info.opens[0].package, "q");
        assert_eq!(info.provides[0].implementations, vec!["I".to_string()]);
    }

    #[test]
    fn transitive_requires_propagates_readability() {
        let mut graph = ModuleGraph::new();
        graph.insert(ModuleInfo::new("a").requires_module("b"));
        graph.insert(ModuleInfo::new("b").requires_transitive("c").requires_module("d"));
        graph.insert(ModuleInfo::new("c"));
        graph.insert(ModuleInfo::new("d"));

        assert!(graph.can_read(&name("a"), &name("b")));
        assert!(graph.can_read(&name("a"), &name("c")));
        assert!(!graph.can_read(&name("a"), &name("d")));
        assert!(graph.can_read(&name("a"), &name(JAVA_BASE)));
    }

    #[test]
    fn qualified_exports_only_reach_named_targets() {
        let info = ModuleInfo::new("lib")
            .exports_package("api")
            .exports_package_qualified("internal", &["friend"]);

        assert!(info.exports_package_to("api", &name("anyone")));
        assert!(info.exports_package_to("internal", &name("friend")));
        assert!(!info.exports_package_to("internal", &name("anyone")));
        assert!(info.exports_package_to("internal", &name("lib")));
        assert!(info.exports_package_to_kind("api", &ModuleKind::Unnamed));
        assert!(!info.exports_package_to_kind("internal", &ModuleKind::Unnamed));
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = ModuleGraph::new();
        graph.insert(ModuleInfo::new("a").requires_transitive("b"));
        graph.insert(ModuleInfo::new("b").requires_transitive("c"));
        graph.insert(ModuleInfo::new("c").requires_transitive("a"));

        assert_eq!(
            graph.readable_modules(&name("a")),
            [name("a"), name("b"), name("c"), name(JAVA_BASE)]
                .into_iter()
                .collect()
        );
        assert!(graph.requires_closure(&name("b")).contains(&name("b")));
    }

    #[test]
    fn detects_cycle_creating_requires() {
        let mut graph = ModuleGraph::new();
        graph.insert(ModuleInfo::new("a"));
        graph.insert(ModuleInfo::new("b").requires_module("c"));
        graph.insert(ModuleInfo::new("c").requires_module("a"));

        assert!(graph.would_create_cycle(&name("a"), &name("b")));
        assert!(graph.would_create_cycle(&name("a"), &name("a")));
        assert!(!graph.would_create_cycle(&name("b"), &name("a")));
    }
}
