use std::collections::BTreeMap;

use nova_hir::CompilationUnit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// User-authored sources.
    #[default]
    Source,
    /// A binary dependency; searched for declarations but never for references.
    Library,
    /// Platform modules (`java.base`, ...); implicitly on every build path.
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDependency {
    pub project: String,
    /// Whether the dependency is placed on the module path rather than the
    /// classpath.
    #[serde(default)]
    pub module_path: bool,
}

impl ProjectDependency {
    pub fn module_path(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            module_path: true,
        }
    }

    pub fn classpath(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            module_path: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub kind: ProjectKind,
    pub dependencies: Vec<ProjectDependency>,
    /// Source texts keyed by workspace path.
    pub files: BTreeMap<String, String>,
    pub units: Vec<CompilationUnit>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProjectKind::Source,
            dependencies: Vec::new(),
            files: BTreeMap::new(),
            units: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ProjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_dependency(mut self, dependency: ProjectDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    pub fn with_unit(mut self, unit: CompilationUnit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn module_info_path(&self) -> Option<&str> {
        self.files
            .keys()
            .map(String::as_str)
            .find(|path| path.ends_with("module-info.java"))
    }

    pub fn unit(&self, path: &str) -> Option<&CompilationUnit> {
        self.units.iter().find(|unit| unit.path == path)
    }

    pub fn is_source(&self) -> bool {
        self.kind == ProjectKind::Source
    }
}

/// A project reachable from another project's build path.
#[derive(Debug, Clone, Copy)]
pub struct BuildPathEntry<'a> {
    pub project: &'a Project,
    pub module_path: bool,
}
