//! JPMS-aware visibility checks.

use std::collections::BTreeMap;

use nova_modules::{ModuleKind, ModuleName};
use nova_project::{Project, TypeRef, Workspace};

/// Module visibility as seen from one project.
///
/// The rules:
/// - a project always sees its own packages
/// - a named module reads only modules reachable through `requires`
///   (`java.base` implicitly) and never the classpath
/// - the unnamed module reads every module on its build path, but only sees
///   their unqualified exports
/// - classpath projects export everything
pub struct JpmsResolver<'a> {
    ws: &'a Workspace,
    project: &'a Project,
    from: ModuleKind,
}

impl<'a> JpmsResolver<'a> {
    pub fn new(ws: &'a Workspace, project: &'a Project) -> Self {
        Self {
            ws,
            project,
            from: ws.module_of(&project.name),
        }
    }

    pub fn module(&self) -> &ModuleKind {
        &self.from
    }

    /// The module of `target` as seen from here; `Unnamed` for classpath entries.
    fn target_module(&self, target: &Project) -> Option<(ModuleKind, bool)> {
        if target.name == self.project.name {
            return Some((self.from.clone(), true));
        }
        let entry = self
            .ws
            .build_path(&self.project.name)
            .into_iter()
            .find(|entry| entry.project.name == target.name)?;
        let module = if entry.module_path {
            self.ws.module_of(&target.name)
        } else {
            ModuleKind::Unnamed
        };
        Some((module, entry.module_path))
    }

    pub fn project_is_readable(&self, target: &Project) -> bool {
        if target.name == self.project.name {
            return true;
        }
        let Some((module, _)) = self.target_module(target) else {
            return false;
        };
        let readable = match (&self.from, &module) {
            (ModuleKind::Unnamed, _) => true,
            (ModuleKind::Named(_), ModuleKind::Unnamed) => false,
            (ModuleKind::Named(from), ModuleKind::Named(to)) => {
                self.ws.module_graph().can_read(from, to)
            }
        };
        if !readable {
            tracing::trace!(
                target: "nova.resolve",
                from = %self.project.name,
                to = %target.name,
                "project not readable"
            );
        }
        readable
    }

    pub fn package_is_visible(&self, target: &Project, package: &str) -> bool {
        if target.name == self.project.name {
            return true;
        }
        if !self.project_is_readable(target) {
            return false;
        }
        let Some((ModuleKind::Named(to), _)) = self.target_module(target) else {
            return true;
        };
        let Some(info) = self.ws.module_graph().get(&to) else {
            return true;
        };
        info.exports_package_to_kind(package, &self.from)
    }

    pub fn type_is_visible(&self, ty: &TypeRef<'_>) -> bool {
        self.package_is_visible(ty.project, ty.package())
    }

    /// Every package visible from this project, mapped to its owning project.
    ///
    /// Own packages win over packages of the same name elsewhere.
    pub fn visible_packages(&self) -> BTreeMap<String, &'a Project> {
        let mut out = BTreeMap::new();
        for package in self.ws.packages(&self.project.name) {
            out.insert(package, self.project);
        }
        for entry in self.ws.build_path(&self.project.name) {
            for package in self.ws.packages(&entry.project.name) {
                if !out.contains_key(&package)
                    && self.package_is_visible(entry.project, &package)
                {
                    out.insert(package, entry.project);
                }
            }
        }
        out
    }

    /// Named modules on the build path (system modules included), other than
    /// this project's own module.
    pub fn build_path_modules(&self) -> Vec<ModuleName> {
        let own = self.from.name();
        let mut out: Vec<ModuleName> = self
            .ws
            .build_path(&self.project.name)
            .into_iter()
            .filter_map(|entry| self.ws.module_of(&entry.project.name).name().cloned())
            .filter(|name| Some(name) != own)
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_hir::{CompilationUnit, TypeDecl};
    use nova_project::{ProjectDependency, ProjectKind};
    use pretty_assertions::assert_eq;

    fn unit(path: &str, package: &str, ty: &str) -> CompilationUnit {
        let mut unit = CompilationUnit::new(path, Some(package));
        unit.types.push(TypeDecl::class(ty));
        unit
    }

    fn workspace() -> Workspace {
        Workspace::new(vec![
            Project::new("App")
                .with_file("/App/src/module-info.java", "module app { requires lib; }")
                .with_unit(unit("/App/src/app/Main.java", "app", "Main"))
                .with_dependency(ProjectDependency::module_path("Lib"))
                .with_dependency(ProjectDependency::classpath("Legacy")),
            Project::new("Lib")
                .with_file(
                    "/Lib/src/module-info.java",
                    "module lib { requires transitive util; exports lib.api; exports lib.friend to other; }",
                )
                .with_unit(unit("/Lib/src/lib/api/Api.java", "lib.api", "Api"))
                .with_unit(unit("/Lib/src/lib/friend/F.java", "lib.friend", "F"))
                .with_unit(unit("/Lib/src/lib/internal/I.java", "lib.internal", "I"))
                .with_dependency(ProjectDependency::module_path("Util")),
            Project::new("Util")
                .with_file("/Util/src/module-info.java", "module util { exports util; }")
                .with_unit(unit("/Util/src/util/U.java", "util", "U")),
            Project::new("Legacy").with_unit(unit("/Legacy/src/legacy/L.java", "legacy", "L")),
            Project::new("Plain")
                .with_unit(unit("/Plain/src/plain/P.java", "plain", "P"))
                .with_dependency(ProjectDependency::module_path("Lib"))
                .with_dependency(ProjectDependency::classpath("Legacy")),
            Project::new("JRE")
                .with_kind(ProjectKind::System)
                .with_file("/JRE/module-info.java", "module java.base { exports java.lang; }")
                .with_unit(unit("/JRE/java/lang/Object.java", "java.lang", "Object")),
        ])
    }

    fn packages(resolver: &JpmsResolver<'_>) -> Vec<String> {
        resolver.visible_packages().into_keys().collect()
    }

    #[test]
    fn named_module_sees_exports_of_readable_modules() {
        let ws = workspace();
        let app = ws.project("App").unwrap();
        let resolver = JpmsResolver::new(&ws, app);
        assert_eq!(
            packages(&resolver),
            ["app", "java.lang", "lib.api", "util"]
        );
        assert!(!resolver.project_is_readable(ws.project("Legacy").unwrap()));
    }

    #[test]
    fn unnamed_module_sees_unqualified_exports_and_classpath() {
        let ws = workspace();
        let plain = ws.project("Plain").unwrap();
        let resolver = JpmsResolver::new(&ws, plain);
        assert_eq!(
            packages(&resolver),
            ["java.lang", "legacy", "lib.api", "plain", "util"]
        );
    }

    #[test]
    fn build_path_modules_exclude_own_module() {
        let ws = workspace();
        let resolver = JpmsResolver::new(&ws, ws.project("App").unwrap());
        let names: Vec<_> = resolver
            .build_path_modules()
            .into_iter()
            .map(|m| m.as_str().to_string())
            .collect();
        assert_eq!(names, ["java.base", "lib", "util"]);
    }
}
