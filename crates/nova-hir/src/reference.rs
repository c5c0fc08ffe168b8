use nova_core::{QualifiedName, TextRange};
use nova_types::{TypeArg, TypeSig};
use serde::{Deserialize, Serialize};

/// What a reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Type,
    Method,
    Constructor,
    Field,
    Package,
    Module,
}

/// Syntactic position of a type reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRole {
    #[default]
    Other,
    /// In an `extends` or `implements` clause.
    Supertype,
    /// In a `permits` clause.
    Permits,
    Import,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    Read,
    Write,
    /// Compound assignment or increment.
    ReadWrite,
}

impl Access {
    pub fn is_read(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub fn is_write(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// The declaration a reference was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Type {
        name: QualifiedName,
    },
    Method {
        owner: QualifiedName,
        name: String,
        params: Vec<TypeSig>,
    },
    Constructor {
        owner: QualifiedName,
        params: Vec<TypeSig>,
    },
    Field {
        owner: QualifiedName,
        name: String,
    },
    Package {
        name: QualifiedName,
    },
    Module {
        name: String,
    },
}

impl Target {
    /// The type that declares a member target, or the type itself.
    pub fn owner(&self) -> Option<&QualifiedName> {
        match self {
            Target::Type { name } => Some(name),
            Target::Method { owner, .. }
            | Target::Constructor { owner, .. }
            | Target::Field { owner, .. } => Some(owner),
            Target::Package { .. } | Target::Module { .. } => None,
        }
    }
}

/// A use of a name inside a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Name as written: simple (`X`, `foo`) or qualified (`p.X`).
    pub name: String,
    /// `None` when the front-end could not bind the reference.
    #[serde(default)]
    pub target: Option<Target>,
    /// Type arguments of the referenced type (`X<String>`, `new X<String>()`).
    #[serde(default)]
    pub type_args: Vec<TypeArg>,
    /// Explicit method or constructor type arguments (`this.<String>foo()`).
    #[serde(default)]
    pub method_type_args: Vec<TypeArg>,
    /// Argument count of a method or constructor invocation.
    #[serde(default)]
    pub arity: Option<usize>,
    #[serde(default)]
    pub role: ReferenceRole,
    #[serde(default)]
    pub access: Access,
    pub range: TextRange,
}

impl Reference {
    pub fn new(kind: ReferenceKind, name: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind,
            name: name.into(),
            target: None,
            type_args: Vec::new(),
            method_type_args: Vec::new(),
            arity: None,
            role: ReferenceRole::Other,
            access: Access::Read,
            range,
        }
    }

    pub fn to_type(name: &str, qualified: &str, range: TextRange) -> Self {
        Self::new(ReferenceKind::Type, name, range).with_target(Target::Type {
            name: QualifiedName::from_dotted(qualified),
        })
    }

    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_type_args(mut self, args: Vec<TypeArg>) -> Self {
        self.type_args = args;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: ReferenceRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    /// Simple name of what was written (`X` for `p.X`).
    pub fn simple_name(&self) -> &str {
        nova_core::simple_name_of(&self.name)
    }
}
