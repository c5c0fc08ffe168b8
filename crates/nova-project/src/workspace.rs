use std::collections::{BTreeMap, BTreeSet, VecDeque};

use nova_core::QualifiedName;
use nova_hir::CompilationUnit;
use nova_modules::{ModuleGraph, ModuleInfo, ModuleKind, ModuleName};
use nova_syntax::parse_module_info_lossy;

use crate::model::{BuildPathEntry, Project, ProjectKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeLoc {
    pub(crate) project: usize,
    pub(crate) unit: usize,
}

/// An immutable snapshot of every project plus the indexes derived from them.
///
/// Mutating operations rebuild the derived state, so queries always observe
/// a consistent module graph and type table.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    projects: Vec<Project>,
    modules: ModuleGraph,
    project_modules: Vec<Option<ModuleName>>,
    build_paths: Vec<Vec<(usize, bool)>>,
    pub(crate) types: BTreeMap<QualifiedName, Vec<TypeLoc>>,
}

impl Workspace {
    pub fn new(projects: Vec<Project>) -> Self {
        let mut ws = Workspace {
            projects,
            ..Workspace::default()
        };
        ws.reindex();
        ws
    }

    pub fn add_project(&mut self, project: Project) {
        if let Some(idx) = self.project_index(&project.name) {
            self.projects[idx] = project;
        } else {
            self.projects.push(project);
        }
        self.reindex();
    }

    /// Replace the text of a file, returning `false` when no project owns it.
    pub fn set_file_text(&mut self, path: &str, text: impl Into<String>) -> bool {
        let Some(project) = self
            .projects
            .iter_mut()
            .find(|p| p.files.contains_key(path))
        else {
            return false;
        };
        project.files.insert(path.to_string(), text.into());
        self.reindex();
        true
    }

    fn reindex(&mut self) {
        self.modules = ModuleGraph::new();
        self.project_modules = Vec::with_capacity(self.projects.len());
        for project in &self.projects {
            let module = project
                .module_info_path()
                .and_then(|path| project.files.get(path))
                .and_then(|text| {
                    let (decl, errors) = parse_module_info_lossy(text);
                    for err in &errors {
                        tracing::debug!(
                            target: "nova.project",
                            project = %project.name,
                            error = %err,
                            "malformed module-info.java"
                        );
                    }
                    decl
                })
                .map(|decl| ModuleInfo::from_decl(&decl));
            self.project_modules
                .push(module.as_ref().map(|info| info.name.clone()));
            if let Some(info) = module {
                self.modules.insert(info);
            }
        }

        self.build_paths = (0..self.projects.len())
            .map(|idx| self.compute_build_path(idx))
            .collect();

        self.types.clear();
        for (project_idx, project) in self.projects.iter().enumerate() {
            for (unit_idx, unit) in project.units.iter().enumerate() {
                for (name, _) in unit.all_types() {
                    self.types.entry(name).or_default().push(TypeLoc {
                        project: project_idx,
                        unit: unit_idx,
                    });
                }
            }
        }

        tracing::debug!(
            target: "nova.project",
            projects = self.projects.len(),
            modules = self.modules.len(),
            types = self.types.len(),
            "indexed workspace"
        );
    }

    fn compute_build_path(&self, from: usize) -> Vec<(usize, bool)> {
        let mut seen = BTreeSet::from([from]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for dep in &self.projects[current].dependencies {
                let Some(idx) = self.project_index(&dep.project) else {
                    tracing::debug!(
                        target: "nova.project",
                        project = %self.projects[current].name,
                        dependency = %dep.project,
                        "unknown project dependency"
                    );
                    continue;
                };
                if seen.insert(idx) {
                    out.push((idx, dep.module_path));
                    queue.push_back(idx);
                }
            }
        }
        for (idx, project) in self.projects.iter().enumerate() {
            if project.kind == ProjectKind::System && seen.insert(idx) {
                out.push((idx, true));
            }
        }
        out
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub(crate) fn project_index(&self, name: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.name == name)
    }

    pub(crate) fn project_at(&self, idx: usize) -> &Project {
        &self.projects[idx]
    }

    pub fn module_graph(&self) -> &ModuleGraph {
        &self.modules
    }

    /// The module a project's sources belong to.
    pub fn module_of(&self, project: &str) -> ModuleKind {
        self.project_index(project)
            .and_then(|idx| self.project_modules[idx].clone())
            .map(ModuleKind::Named)
            .unwrap_or(ModuleKind::Unnamed)
    }

    pub fn module_info(&self, project: &str) -> Option<&ModuleInfo> {
        match self.module_of(project) {
            ModuleKind::Named(name) => self.modules.get(&name),
            ModuleKind::Unnamed => None,
        }
    }

    pub fn project_of_module(&self, module: &ModuleName) -> Option<&Project> {
        self.project_modules
            .iter()
            .position(|m| m.as_ref() == Some(module))
            .map(|idx| &self.projects[idx])
    }

    /// Projects visible from `project`: transitive dependencies first, then
    /// system projects. The project itself is not included.
    pub fn build_path(&self, project: &str) -> Vec<BuildPathEntry<'_>> {
        let Some(idx) = self.project_index(project) else {
            return Vec::new();
        };
        self.build_paths[idx]
            .iter()
            .map(|&(dep, module_path)| BuildPathEntry {
                project: &self.projects[dep],
                module_path,
            })
            .collect()
    }

    pub(crate) fn on_build_path(&self, from: usize, target: usize) -> bool {
        from == target || self.build_paths[from].iter().any(|&(idx, _)| idx == target)
    }

    pub fn project_of_file(&self, path: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.files.contains_key(path) || p.unit(path).is_some())
    }

    pub fn file_text(&self, path: &str) -> Option<&str> {
        self.projects
            .iter()
            .find_map(|p| p.files.get(path))
            .map(String::as_str)
    }

    pub fn unit(&self, path: &str) -> Option<(&Project, &CompilationUnit)> {
        self.projects
            .iter()
            .find_map(|p| p.unit(path).map(|unit| (p, unit)))
    }

    /// Packages declared by the compilation units of a project.
    pub fn packages(&self, project: &str) -> BTreeSet<String> {
        self.project(project)
            .map(|p| {
                p.units
                    .iter()
                    .filter(|unit| !unit.is_module_info())
                    .filter_map(|unit| unit.package.as_ref())
                    .map(|pkg| pkg.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectDependency;
    use pretty_assertions::assert_eq;

    fn workspace() -> Workspace {
        Workspace::new(vec![
            Project::new("A")
                .with_file("/A/src/module-info.java", "module a { requires b; }")
                .with_dependency(ProjectDependency::module_path("B")),
            Project::new("B")
                .with_file("/B/src/module-info.java", "module b { requires transitive c; }")
                .with_dependency(ProjectDependency::module_path("C")),
            Project::new("C").with_file("/C/src/module-info.java", "module c {"),
            Project::new("JRE")
                .with_kind(ProjectKind::System)
                .with_file("/JRE/java.base/module-info.java", "module java.base { exports java.lang; }"),
            Project::new("Plain"),
        ])
    }

    #[test]
    fn modules_come_from_module_info() {
        let ws = workspace();
        assert_eq!(ws.module_of("A"), ModuleKind::Named(ModuleName::new("a")));
        assert_eq!(ws.module_of("Plain"), ModuleKind::Unnamed);
        // A truncated descriptor still declares its module.
        assert_eq!(ws.module_of("C"), ModuleKind::Named(ModuleName::new("c")));
        assert!(ws.module_graph().can_read(&ModuleName::new("a"), &ModuleName::new("c")));
        assert_eq!(
            ws.project_of_module(&ModuleName::new("b")).map(|p| p.name.as_str()),
            Some("B")
        );
    }

    #[test]
    fn build_path_is_transitive_and_includes_system() {
        let ws = workspace();
        let names: Vec<_> = ws
            .build_path("A")
            .into_iter()
            .map(|e| e.project.name.as_str())
            .collect();
        assert_eq!(names, ["B", "C", "JRE"]);
        assert!(ws.build_path("Missing").is_empty());
    }

    #[test]
    fn editing_module_info_rebuilds_graph() {
        let mut ws = workspace();
        assert!(ws.set_file_text("/C/src/module-info.java", "module c.renamed {}"));
        assert_eq!(
            ws.module_of("C"),
            ModuleKind::Named(ModuleName::new("c.renamed"))
        );
        assert!(!ws.set_file_text("/nowhere/X.java", ""));
    }
}
