//! Type table queries: lookup, simple-name resolution and subtyping.

use std::collections::{BTreeSet, VecDeque};

use nova_core::{QualifiedName, TextSize, JAVA_LANG, JAVA_LANG_OBJECT};
use nova_hir::{CompilationUnit, ImportDecl, TypeDecl, TypeKind};

use crate::model::Project;
use crate::workspace::{TypeLoc, Workspace};

/// A type declaration located in the workspace.
#[derive(Debug, Clone, Copy)]
pub struct TypeRef<'a> {
    pub name: &'a QualifiedName,
    pub decl: &'a TypeDecl,
    pub unit: &'a CompilationUnit,
    pub project: &'a Project,
}

impl<'a> TypeRef<'a> {
    pub fn package(&self) -> &'a str {
        self.unit.package_name()
    }

    pub fn simple_name(&self) -> &'a str {
        self.decl.name.as_str()
    }

    /// `Outer.Inner` for nested types, the simple name otherwise.
    pub fn name_in_package(&self) -> &'a str {
        let package = self.package();
        if package.is_empty() {
            self.name.as_str()
        } else {
            &self.name.as_str()[package.len() + 1..]
        }
    }

    pub fn is_nested(&self) -> bool {
        self.name_in_package().contains('.')
    }

    /// Qualified name of the directly enclosing type.
    pub fn outer(&self) -> Option<&'a str> {
        self.is_nested().then(|| self.name.qualifier())
    }

    pub fn is_throwable(&self, ws: &Workspace) -> bool {
        ws.is_subtype(self.name.as_str(), nova_core::JAVA_LANG_THROWABLE)
    }
}

/// The place a type name is written in, used to resolve simple names.
#[derive(Debug, Clone)]
pub struct TypeScope<'a> {
    pub project: &'a Project,
    pub unit: &'a CompilationUnit,
    /// Enclosing type declarations, innermost last.
    pub enclosing: Vec<QualifiedName>,
}

impl<'a> TypeScope<'a> {
    pub fn new(project: &'a Project, unit: &'a CompilationUnit) -> Self {
        Self {
            project,
            unit,
            enclosing: Vec::new(),
        }
    }

    pub fn at(project: &'a Project, unit: &'a CompilationUnit, offset: TextSize) -> Self {
        let enclosing = unit
            .enclosing(offset)
            .types
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        Self {
            project,
            unit,
            enclosing,
        }
    }

    /// Scope of the body of `ty` (the type and its outer types).
    pub fn inside(ty: &TypeRef<'a>) -> Self {
        let full = ty.name.as_str();
        let mut enclosing: Vec<QualifiedName> = ty
            .unit
            .all_types()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| {
                full == name.as_str()
                    || full
                        .strip_prefix(name.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .collect();
        enclosing.sort_by_key(|name| name.as_str().len());
        Self {
            project: ty.project,
            unit: ty.unit,
            enclosing,
        }
    }
}

impl Workspace {
    fn type_ref(&self, name: &QualifiedName, loc: TypeLoc) -> Option<TypeRef<'_>> {
        let project = self.project_at(loc.project);
        let unit = &project.units[loc.unit];
        let (_, decl) = unit
            .all_types()
            .into_iter()
            .find(|(candidate, _)| candidate == name)?;
        let (name, _) = self.types.get_key_value(name)?;
        Some(TypeRef {
            name,
            decl,
            unit,
            project,
        })
    }

    /// Every type declared in the workspace, ordered by qualified name.
    pub fn all_types(&self) -> impl Iterator<Item = TypeRef<'_>> {
        self.types.iter().flat_map(move |(name, locs)| {
            locs.iter().filter_map(move |&loc| self.type_ref(name, loc))
        })
    }

    /// Types visible on the build path of `project` (its own included).
    pub fn types_visible_from<'a>(
        &'a self,
        project: &'a Project,
    ) -> impl Iterator<Item = TypeRef<'a>> + 'a {
        let from = self.project_index(&project.name);
        self.types.iter().flat_map(move |(name, locs)| {
            locs.iter()
                .filter(move |loc| from.is_some_and(|from| self.on_build_path(from, loc.project)))
                .filter_map(move |&loc| self.type_ref(name, loc))
        })
    }

    pub fn find_type(&self, name: &str) -> Option<TypeRef<'_>> {
        let name = QualifiedName::from_dotted(name);
        let loc = *self.types.get(&name)?.first()?;
        self.type_ref(&name, loc)
    }

    /// Find `name` among the types on the build path of `project`.
    pub fn find_type_from(&self, project: &Project, name: &str) -> Option<TypeRef<'_>> {
        let from = self.project_index(&project.name)?;
        let name = QualifiedName::from_dotted(name);
        let locs = self.types.get(&name)?;
        let loc = locs
            .iter()
            .find(|loc| loc.project == from)
            .or_else(|| locs.iter().find(|loc| self.on_build_path(from, loc.project)))?;
        self.type_ref(&name, *loc)
    }

    /// Resolve a type name as written in `scope`.
    ///
    /// Qualified names are tried as written first, then as a member type of
    /// their resolved first segment (`Outer.Inner`).
    pub fn resolve_type(&self, scope: &TypeScope<'_>, written: &str) -> Option<TypeRef<'_>> {
        let written = written.trim();
        match written.split_once('.') {
            Some((head, rest)) => {
                if let Some(ty) = self.find_type_from(scope.project, written) {
                    return Some(ty);
                }
                let outer = self.resolve_simple(scope, head)?;
                self.find_type_from(scope.project, &format!("{}.{rest}", outer.name))
            }
            None => self.resolve_simple(scope, written),
        }
    }

    fn resolve_simple(&self, scope: &TypeScope<'_>, name: &str) -> Option<TypeRef<'_>> {
        let project = scope.project;

        for outer in scope.enclosing.iter().rev() {
            if outer.last() == name {
                return self.find_type_from(project, outer.as_str());
            }
            if let Some(ty) = self.find_type_from(project, &format!("{outer}.{name}")) {
                return Some(ty);
            }
        }

        for import in &scope.unit.imports {
            if let ImportDecl::TypeSingle { ty } = import {
                if ty.last() == name {
                    return self.find_type_from(project, ty.as_str());
                }
            }
        }

        let package = scope.unit.package_name();
        let same_package = if package.is_empty() {
            name.to_string()
        } else {
            format!("{package}.{name}")
        };
        if let Some(ty) = self.find_type_from(project, &same_package) {
            return Some(ty);
        }

        for import in &scope.unit.imports {
            let qualifier = match import {
                ImportDecl::TypeStar { package } => package,
                ImportDecl::StaticStar { ty } => ty,
                _ => continue,
            };
            if let Some(ty) = self.find_type_from(project, &format!("{qualifier}.{name}")) {
                return Some(ty);
            }
        }

        self.find_type_from(project, &format!("{JAVA_LANG}.{name}"))
    }

    /// Direct supertypes of `ty`, resolved in the scope of its declaration.
    ///
    /// Classes without an `extends` clause extend `java.lang.Object`.
    pub fn direct_supertypes<'a>(&'a self, ty: &TypeRef<'a>) -> Vec<TypeRef<'a>> {
        let scope = TypeScope::inside(ty);
        let mut out: Vec<TypeRef<'a>> = ty
            .decl
            .supertypes()
            .filter_map(|sig| self.resolve_type(&scope, &sig.name))
            .collect();
        let implicit_object = ty.decl.superclass.is_none()
            && matches!(ty.decl.kind, TypeKind::Class | TypeKind::Enum | TypeKind::Record)
            && ty.name.as_str() != JAVA_LANG_OBJECT;
        if implicit_object {
            if let Some(object) = self.find_type_from(ty.project, JAVA_LANG_OBJECT) {
                out.push(object);
            }
        }
        out
    }

    /// All proper supertypes of `ty`, nearest first. Cycles are tolerated.
    pub fn supertypes<'a>(&'a self, ty: &TypeRef<'a>) -> Vec<TypeRef<'a>> {
        let mut seen = BTreeSet::from([ty.name.as_str()]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([*ty]);
        while let Some(current) = queue.pop_front() {
            for sup in self.direct_supertypes(&current) {
                if seen.insert(sup.name.as_str()) {
                    out.push(sup);
                    queue.push_back(sup);
                }
            }
        }
        out
    }

    /// Whether `sub` is `sup` or one of its subtypes.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == JAVA_LANG_OBJECT {
            return true;
        }
        let Some(ty) = self.find_type(sub) else {
            return false;
        };
        self.supertypes(&ty)
            .iter()
            .any(|candidate| candidate.name.as_str() == sup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProjectDependency, ProjectKind};
    use nova_core::TextRange;
    use nova_hir::{ImportDecl, TypeDecl};
    use nova_types::TypeSig;
    use pretty_assertions::assert_eq;

    fn unit(path: &str, package: &str, types: Vec<TypeDecl>) -> CompilationUnit {
        let mut unit = CompilationUnit::new(path, Some(package));
        unit.types = types;
        unit
    }

    fn workspace() -> Workspace {
        let mut outer = TypeDecl::class("Outer");
        outer.range = Some(TextRange::new(TextSize::from(0), TextSize::from(100)));
        outer.nested_types.push(TypeDecl::interface("Inner"));

        let mut list = TypeDecl::interface("List");
        list.type_params.push("E".into());
        list.interfaces.push(TypeSig::simple("Collection"));

        let mut array_list = TypeDecl::class("ArrayList");
        array_list.interfaces.push(TypeSig::simple("List"));

        let mut uses_import = unit("/App/src/app/Main.java", "app", vec![TypeDecl::class("Main")]);
        uses_import.imports.push(ImportDecl::star("java.util"));

        Workspace::new(vec![
            Project::new("JRE")
                .with_kind(ProjectKind::System)
                .with_unit(unit("/JRE/java/lang/Object.java", "java.lang", vec![TypeDecl::class("Object")]))
                .with_unit(unit("/JRE/java/lang/String.java", "java.lang", vec![TypeDecl::class("String")]))
                .with_unit(unit(
                    "/JRE/java/util/List.java",
                    "java.util",
                    vec![TypeDecl::interface("Collection"), list, array_list],
                )),
            Project::new("Lib").with_unit(unit("/Lib/src/lib/Outer.java", "lib", vec![outer])),
            Project::new("App")
                .with_dependency(ProjectDependency::classpath("Lib"))
                .with_unit(uses_import),
            Project::new("Other").with_unit(unit("/Other/src/x/Hidden.java", "x", vec![TypeDecl::class("Hidden")])),
        ])
    }

    #[test]
    fn resolves_names_through_imports_and_java_lang() {
        let ws = workspace();
        let (project, unit) = ws.unit("/App/src/app/Main.java").unwrap();
        let scope = TypeScope::new(project, unit);

        let resolve = |name: &str| ws.resolve_type(&scope, name).map(|t| t.name.as_str().to_string());
        assert_eq!(resolve("List").as_deref(), Some("java.util.List"));
        assert_eq!(resolve("String").as_deref(), Some("java.lang.String"));
        assert_eq!(resolve("Main").as_deref(), Some("app.Main"));
        assert_eq!(resolve("lib.Outer.Inner").as_deref(), Some("lib.Outer.Inner"));
        assert_eq!(resolve("x.Hidden"), None);
    }

    #[test]
    fn nested_names_resolve_inside_outer_type() {
        let ws = workspace();
        let (project, unit) = ws.unit("/Lib/src/lib/Outer.java").unwrap();
        let scope = TypeScope::at(project, unit, TextSize::from(10));
        let inner = ws.resolve_type(&scope, "Inner").unwrap();
        assert_eq!(inner.name.as_str(), "lib.Outer.Inner");
        assert_eq!(inner.name_in_package(), "Outer.Inner");
        assert_eq!(inner.outer(), Some("lib.Outer"));
    }

    #[test]
    fn subtyping_is_transitive() {
        let ws = workspace();
        assert!(ws.is_subtype("java.util.ArrayList", "java.util.Collection"));
        assert!(ws.is_subtype("java.util.ArrayList", JAVA_LANG_OBJECT));
        assert!(!ws.is_subtype("java.util.Collection", "java.util.List"));

        let array_list = ws.find_type("java.util.ArrayList").unwrap();
        let names: Vec<_> = ws
            .supertypes(&array_list)
            .into_iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, ["java.util.List", "java.lang.Object", "java.util.Collection"]);
    }
}
