use nova_core::{QualifiedName, TextSize, Visibility};
use nova_hir::CompilationUnit;
use nova_project::{Project, TypeRef, TypeScope, Workspace};

use crate::jpms::JpmsResolver;

/// The location a declaration is accessed from.
pub struct AccessContext<'a> {
    pub ws: &'a Workspace,
    pub project: &'a Project,
    pub unit: &'a CompilationUnit,
    /// Enclosing types at the access location, innermost last.
    pub enclosing: Vec<QualifiedName>,
    jpms: JpmsResolver<'a>,
}

impl<'a> AccessContext<'a> {
    pub fn new(
        ws: &'a Workspace,
        project: &'a Project,
        unit: &'a CompilationUnit,
        offset: TextSize,
    ) -> Self {
        let scope = TypeScope::at(project, unit, offset);
        Self {
            ws,
            project,
            unit,
            enclosing: scope.enclosing,
            jpms: JpmsResolver::new(ws, project),
        }
    }

    pub fn jpms(&self) -> &JpmsResolver<'a> {
        &self.jpms
    }

    pub fn package(&self) -> &str {
        self.unit.package_name()
    }

    pub fn scope(&self) -> TypeScope<'a> {
        TypeScope {
            project: self.project,
            unit: self.unit,
            enclosing: self.enclosing.clone(),
        }
    }

    /// Whether `ty` can be named here: its module exports it to us and each
    /// type on its nesting chain is accessible.
    pub fn type_is_accessible(&self, ty: &TypeRef<'_>) -> bool {
        if !self.jpms.type_is_visible(ty) {
            return false;
        }
        self.type_access_ok(ty)
    }

    fn type_access_ok(&self, ty: &TypeRef<'_>) -> bool {
        match ty.outer().and_then(|outer| self.ws.find_type_from(ty.project, outer)) {
            Some(outer) => {
                self.type_access_ok(&outer)
                    && self.member_is_accessible(&outer, ty.decl.visibility())
            }
            None => {
                ty.decl.visibility() == Visibility::Public || ty.package() == self.package()
            }
        }
    }

    /// Java access control for a member of `owner` declared with `visibility`.
    pub fn member_is_accessible(&self, owner: &TypeRef<'_>, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Private => self
                .enclosing
                .first()
                .is_some_and(|top| top_level_of(owner) == top.as_str()),
            Visibility::Package => owner.package() == self.package(),
            Visibility::Protected => {
                owner.package() == self.package()
                    || self
                        .enclosing
                        .iter()
                        .any(|inner| self.ws.is_subtype(inner.as_str(), owner.name.as_str()))
            }
        }
    }

    /// Concrete types that can be named in `provides <service> with ...`.
    pub fn implements_service(&self, ty: &TypeRef<'_>, service: &TypeRef<'_>) -> bool {
        !ty.decl.is_abstract()
            && ty.name != service.name
            && self.ws.is_subtype(ty.name.as_str(), service.name.as_str())
    }
}

/// Qualified name of the top-level type that (transitively) encloses `ty`.
fn top_level_of(ty: &TypeRef<'_>) -> String {
    let outermost = ty
        .name_in_package()
        .split('.')
        .next()
        .unwrap_or_default();
    match ty.package() {
        "" => outermost.to_string(),
        package => format!("{package}.{outermost}"),
    }
}
