//! High-level intermediate representation (HIR) for Java.
//!
//! The HIR is a declaration model: compilation units with their package,
//! imports, type declarations and the resolved (or unresolved) references
//! found in their bodies. It is produced by a front-end outside of Nova's
//! query engine and consumed read-only by completion, search and code select.
//! Every type derives `serde` so a workspace can be loaded from a manifest.

use nova_core::{Modifiers, Name, QualifiedName, TextRange, TextSize, Visibility};
use nova_types::{TypeArg, TypeSig};
use serde::{Deserialize, Serialize};

mod reference;

pub use reference::{Access, Reference, ReferenceKind, ReferenceRole, Target};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Workspace-relative path, e.g. `/Test/src/p/X.java`.
    pub path: String,
    #[serde(default)]
    pub package: Option<QualifiedName>,
    /// Range of the name in the `package` declaration.
    #[serde(default)]
    pub package_range: Option<TextRange>,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl CompilationUnit {
    pub fn new(path: impl Into<String>, package: Option<&str>) -> Self {
        Self {
            path: path.into(),
            package: package.map(QualifiedName::from_dotted),
            package_range: None,
            imports: Vec::new(),
            types: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        self.package.as_ref().map(QualifiedName::as_str).unwrap_or("")
    }

    pub fn is_module_info(&self) -> bool {
        self.path.ends_with("module-info.java")
    }

    /// All type declarations in this unit, nested ones included, with their
    /// qualified names (`p.Outer.Inner`). Outer types precede inner ones.
    pub fn all_types(&self) -> Vec<(QualifiedName, &TypeDecl)> {
        let mut out = Vec::new();
        for ty in &self.types {
            collect_types(self.package_name(), ty, &mut out);
        }
        out
    }

    /// Declarations enclosing `offset`, innermost last.
    pub fn enclosing(&self, offset: TextSize) -> Enclosing<'_> {
        let mut enclosing = Enclosing {
            types: Vec::new(),
            member: None,
        };
        let mut qualifier = self.package_name().to_string();
        let mut scope = &self.types;
        'outer: loop {
            for ty in scope {
                if !ty.range.is_some_and(|r| r.contains_inclusive(offset)) {
                    continue;
                }
                qualifier = join(&qualifier, ty.name.as_str());
                enclosing
                    .types
                    .push((QualifiedName::from_dotted(qualifier.clone()), ty));
                scope = &ty.nested_types;
                continue 'outer;
            }
            break;
        }

        if let Some((_, ty)) = enclosing.types.last() {
            enclosing.member = ty.member_at(offset);
        }
        enclosing
    }
}

fn join(qualifier: &str, name: &str) -> String {
    if qualifier.is_empty() {
        name.to_string()
    } else {
        format!("{qualifier}.{name}")
    }
}

fn collect_types<'a>(qualifier: &str, ty: &'a TypeDecl, out: &mut Vec<(QualifiedName, &'a TypeDecl)>) {
    let name = join(qualifier, ty.name.as_str());
    out.push((QualifiedName::from_dotted(name.clone()), ty));
    for nested in &ty.nested_types {
        collect_types(&name, nested, out);
    }
}

/// The declarations surrounding an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberRef<'a> {
    Method(&'a MethodDecl),
    Constructor(&'a ConstructorDecl),
    Field(&'a FieldDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enclosing<'a> {
    pub types: Vec<(QualifiedName, &'a TypeDecl)>,
    pub member: Option<MemberRef<'a>>,
}

impl<'a> Enclosing<'a> {
    pub fn innermost_type(&self) -> Option<(&QualifiedName, &'a TypeDecl)> {
        self.types.last().map(|(name, ty)| (name, *ty))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportDecl {
    /// `import p.X;`
    TypeSingle { ty: QualifiedName },
    /// `import p.*;`
    TypeStar { package: QualifiedName },
    /// `import static p.X.m;`
    StaticSingle { ty: QualifiedName, member: Name },
    /// `import static p.X.*;`
    StaticStar { ty: QualifiedName },
}

impl ImportDecl {
    pub fn single(ty: &str) -> Self {
        ImportDecl::TypeSingle {
            ty: QualifiedName::from_dotted(ty),
        }
    }

    pub fn star(package: &str) -> Self {
        ImportDecl::TypeStar {
            package: QualifiedName::from_dotted(package),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(
            self,
            ImportDecl::StaticSingle { .. } | ImportDecl::StaticStar { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn is_interface_like(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Annotation)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: Name,
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<Name>,
    #[serde(default)]
    pub superclass: Option<TypeSig>,
    #[serde(default)]
    pub interfaces: Vec<TypeSig>,
    #[serde(default)]
    pub permits: Vec<TypeSig>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub nested_types: Vec<TypeDecl>,
    /// Whole declaration, modifiers to closing brace.
    #[serde(default)]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub name_range: Option<TextRange>,
}

impl TypeDecl {
    pub fn new(name: impl Into<Name>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::PUBLIC,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            permits: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            nested_types: Vec::new(),
            range: None,
            name_range: None,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract || self.kind.is_interface_like()
    }

    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility
    }

    /// Direct supertypes as written: superclass first, then interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeSig> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    fn member_at(&self, offset: TextSize) -> Option<MemberRef<'_>> {
        let inside = |range: &Option<TextRange>| range.is_some_and(|r| r.contains_inclusive(offset));
        if let Some(method) = self.methods.iter().find(|m| inside(&m.range)) {
            return Some(MemberRef::Method(method));
        }
        if let Some(ctor) = self.constructors.iter().find(|c| inside(&c.range)) {
            return Some(MemberRef::Constructor(ctor));
        }
        self.fields
            .iter()
            .find(|f| inside(&f.range))
            .map(MemberRef::Field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: TypeSig,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub name_range: Option<TextRange>,
}

impl FieldDecl {
    pub fn new(name: impl Into<Name>, ty: TypeSig) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::PUBLIC,
            range: None,
            name_range: None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: Name,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<Name>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    pub return_type: TypeSig,
    #[serde(default)]
    pub throws: Vec<TypeSig>,
    #[serde(default)]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub name_range: Option<TextRange>,
}

impl MethodDecl {
    pub fn new(name: impl Into<Name>, return_type: TypeSig) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            type_params: Vec::new(),
            params: Vec::new(),
            return_type,
            throws: Vec::new(),
            range: None,
            name_range: None,
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, ty: TypeSig) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    pub fn param_types(&self) -> Vec<TypeSig> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// Whether a call with `arity` arguments can target this method.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        accepts_arity(&self.params, arity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<Name>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub name_range: Option<TextRange>,
}

impl ConstructorDecl {
    pub fn new() -> Self {
        Self {
            modifiers: Modifiers::PUBLIC,
            type_params: Vec::new(),
            params: Vec::new(),
            range: None,
            name_range: None,
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, ty: TypeSig) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    pub fn param_types(&self) -> Vec<TypeSig> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn accepts_arity(&self, arity: usize) -> bool {
        accepts_arity(&self.params, arity)
    }
}

impl Default for ConstructorDecl {
    fn default() -> Self {
        Self::new()
    }
}

fn accepts_arity(params: &[ParamDecl], arity: usize) -> bool {
    match params.last() {
        Some(last) if last.is_varargs => arity + 1 >= params.len(),
        _ => params.len() == arity,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: Name,
    pub ty: TypeSig,
    #[serde(default)]
    pub is_varargs: bool,
}

impl ParamDecl {
    pub fn new(name: impl Into<Name>, ty: TypeSig) -> Self {
        Self {
            name: name.into(),
            ty,
            is_varargs: false,
        }
    }
}

/// Type arguments of a reference are either absent (raw or non-generic use)
/// or given explicitly; diamonds are recorded as inferred arguments.
pub fn is_raw_use(args: &[TypeArg], decl: &TypeDecl) -> bool {
    args.is_empty() && decl.is_generic()
}
