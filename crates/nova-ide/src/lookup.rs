//! Name lookup at a position: locals, fields of the enclosing types and
//! dotted receiver expressions. Shared by completion and code select.

use nova_core::TextSize;
use nova_hir::{CompilationUnit, Enclosing, FieldDecl, MemberRef};
use nova_project::{Project, TypeRef, TypeScope, Workspace};
use nova_resolve::AccessContext;
use nova_types::TypeSig;

use crate::completion::ScopeHints;
use crate::scan::Structure;

/// What a dotted expression denotes.
#[derive(Debug, Clone)]
pub(crate) enum Receiver<'a> {
    /// A value of the type.
    Instance(TypeRef<'a>),
    /// The type itself, as in `Type.member`.
    Static(TypeRef<'a>),
    Package(String),
}

pub(crate) struct Lookup<'a, 'b> {
    pub ws: &'a Workspace,
    pub project: &'a Project,
    pub unit: &'a CompilationUnit,
    pub access: &'b AccessContext<'a>,
    pub structure: &'b Structure,
    pub hints: &'b ScopeHints,
    pub offset: TextSize,
}

impl<'a> Lookup<'a, '_> {
    pub fn enclosing(&self) -> Enclosing<'a> {
        self.unit.enclosing(self.offset)
    }

    pub fn this_type(&self) -> Option<TypeRef<'a>> {
        let enclosing = self.enclosing();
        let (name, _) = enclosing.innermost_type()?;
        self.ws.find_type_from(self.project, name.as_str())
    }

    /// Locals in scope, innermost first: caller hints, then what the buffer declares.
    pub fn locals(&self) -> Vec<(String, Option<TypeSig>)> {
        let mut out: Vec<(String, Option<TypeSig>)> = self
            .hints
            .locals
            .iter()
            .map(|(name, ty)| (name.clone(), Some(ty.clone())))
            .collect();
        for local in self.structure.locals() {
            if !out.iter().any(|(name, _)| *name == local.name) {
                out.push((local.name.clone(), local.ty.clone()));
            }
        }
        out
    }

    /// The declared type of local `name`; `Some(None)` for an untyped local.
    pub fn local(&self, name: &str) -> Option<Option<TypeSig>> {
        self.locals()
            .into_iter()
            .find(|(local, _)| local == name)
            .map(|(_, ty)| ty)
    }

    pub fn is_static_context(&self) -> bool {
        if let Some(is_static) = self.hints.is_static {
            return is_static;
        }
        if self.structure.is_static() {
            return true;
        }
        match self.enclosing().member {
            Some(MemberRef::Method(method)) => method.is_static(),
            Some(MemberRef::Field(field)) => field.is_static(),
            _ => false,
        }
    }

    /// Accessible field `name` of `ty` or of its nearest supertype declaring one.
    pub fn find_field(&self, ty: &TypeRef<'a>, name: &str) -> Option<(TypeRef<'a>, &'a FieldDecl)> {
        std::iter::once(*ty)
            .chain(self.ws.supertypes(ty))
            .find_map(|owner| {
                let field = owner.decl.fields.iter().find(|f| f.name.as_str() == name)?;
                self.access
                    .member_is_accessible(&owner, field.modifiers.visibility)
                    .then_some((owner, field))
            })
    }

    /// Field `name` of an enclosing type, innermost first.
    pub fn enclosing_field(&self, name: &str) -> Option<(TypeRef<'a>, &'a FieldDecl)> {
        self.enclosing().types.iter().rev().find_map(|(qualified, _)| {
            let ty = self.ws.find_type_from(self.project, qualified.as_str())?;
            self.find_field(&ty, name)
        })
    }

    pub fn field_type(&self, owner: &TypeRef<'a>, field: &FieldDecl) -> Option<TypeRef<'a>> {
        self.ws
            .resolve_type(&TypeScope::inside(owner), &field.ty.name)
    }

    /// Resolve `receiver`, the compacted text before a `.`. Calls and array
    /// accesses are not evaluated.
    pub fn resolve_receiver(&self, scope: &TypeScope<'_>, receiver: &str) -> Option<Receiver<'a>> {
        if receiver.contains(['(', '[']) {
            return None;
        }
        let mut segments = receiver.split('.');
        let mut current = self.first_segment(scope, segments.next()?)?;
        for segment in segments {
            current = self.member_segment(current, segment)?;
        }
        Some(current)
    }

    /// `segment` looked up in what `current` denotes.
    pub fn member_segment(&self, current: Receiver<'a>, segment: &str) -> Option<Receiver<'a>> {
        Some(match current {
            Receiver::Instance(ty) | Receiver::Static(ty) => {
                if let Some((owner, field)) = self.find_field(&ty, segment) {
                    Receiver::Instance(self.field_type(&owner, field)?)
                } else {
                    let nested = format!("{}.{segment}", ty.name);
                    Receiver::Static(self.ws.find_type_from(self.project, &nested)?)
                }
            }
            Receiver::Package(package) => {
                let name = format!("{package}.{segment}");
                match self.ws.find_type_from(self.project, &name) {
                    Some(ty) => Receiver::Static(ty),
                    None => Receiver::Package(name),
                }
            }
        })
    }

    fn first_segment(&self, scope: &TypeScope<'_>, name: &str) -> Option<Receiver<'a>> {
        match name {
            "this" => return self.this_type().map(Receiver::Instance),
            "super" => {
                let this_type = self.this_type()?;
                return self
                    .ws
                    .direct_supertypes(&this_type)
                    .into_iter()
                    .find(|sup| !sup.decl.kind.is_interface_like())
                    .map(Receiver::Instance);
            }
            _ => {}
        }
        if let Some(ty) = self.local(name) {
            return self.ws.resolve_type(scope, &ty?.name).map(Receiver::Instance);
        }
        if let Some((owner, field)) = self.enclosing_field(name) {
            return self.field_type(&owner, field).map(Receiver::Instance);
        }
        if let Some(ty) = self.ws.resolve_type(scope, name) {
            return Some(Receiver::Static(ty));
        }
        Some(Receiver::Package(name.to_string()))
    }
}
