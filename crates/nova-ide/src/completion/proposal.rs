use std::collections::HashMap;
use std::fmt;

use nova_core::TextRange;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionKind {
    Keyword,
    PackageRef,
    ModuleRef,
    TypeRef,
    MethodRef,
    FieldRef,
    LocalVariableRef,
    AnnotationAttributeRef,
    ModuleDeclaration,
}

impl CompletionKind {
    pub fn label(self) -> &'static str {
        match self {
            CompletionKind::Keyword => "KEYWORD",
            CompletionKind::PackageRef => "PACKAGE_REF",
            CompletionKind::ModuleRef => "MODULE_REF",
            CompletionKind::TypeRef => "TYPE_REF",
            CompletionKind::MethodRef => "METHOD_REF",
            CompletionKind::FieldRef => "FIELD_REF",
            CompletionKind::LocalVariableRef => "LOCAL_VARIABLE_REF",
            CompletionKind::AnnotationAttributeRef => "ANNOTATION_ATTRIBUTE_REF",
            CompletionKind::ModuleDeclaration => "MODULE_DECLARATION",
        }
    }

    /// Reference kinds whose rendering carries no display name or parameter
    /// names (the five-field form).
    pub fn is_name_reference(self) -> bool {
        matches!(
            self,
            CompletionKind::PackageRef
                | CompletionKind::ModuleRef
                | CompletionKind::TypeRef
                | CompletionKind::ModuleDeclaration
        )
    }
}

impl fmt::Display for CompletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One finalized completion proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub kind: CompletionKind,
    /// Name used for display and as the secondary sort key.
    pub name: String,
    /// Text inserted over `replace_range`.
    pub completion: String,
    /// Declaring package, type or module.
    pub declaration_signature: Option<String>,
    /// JVM-style signature: `(I)V` for methods, `Lp.X;` for types and fields.
    pub signature: Option<String>,
    pub parameter_names: Option<Vec<String>>,
    pub relevance: i32,
    pub replace_range: TextRange,
}

/// Renders the textual record:
/// `name[KIND]{completion, declaration, signature, name, parameters, relevance}`;
/// module, package and type references drop the parameter slot and show
/// `null` as display name.
impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_null = |value: &Option<String>| value.clone().unwrap_or_else(|| "null".into());
        write!(
            f,
            "{}[{}]{{{}, {}, {}, ",
            self.name,
            self.kind,
            self.completion,
            or_null(&self.declaration_signature),
            or_null(&self.signature),
        )?;
        if self.kind.is_name_reference() {
            return write!(f, "null, {}}}", self.relevance);
        }
        let params = self
            .parameter_names
            .as_ref()
            .map(|names| format!("({})", names.join(", ")))
            .unwrap_or_else(|| "null".into());
        write!(f, "{}, {}, {}}}", self.name, params, self.relevance)
    }
}

/// A proposal before the prefix has been matched and relevance finalized.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub kind: CompletionKind,
    pub name: String,
    pub completion: String,
    pub declaration_signature: Option<String>,
    pub signature: Option<String>,
    pub parameter_names: Option<Vec<String>>,
    /// Context-dependent relevance on top of the base and name match.
    pub relevance: i32,
}

impl Candidate {
    fn new(kind: CompletionKind, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind,
            completion: name.clone(),
            name,
            declaration_signature: None,
            signature: None,
            parameter_names: None,
            relevance: 0,
        }
    }

    pub fn keyword(word: &str) -> Self {
        Self::new(CompletionKind::Keyword, word)
    }

    pub fn module(name: &str) -> Self {
        let mut c = Self::new(CompletionKind::ModuleRef, name);
        c.declaration_signature = Some(name.to_string());
        c
    }

    pub fn module_declaration(name: &str) -> Self {
        let mut c = Self::new(CompletionKind::ModuleDeclaration, name);
        c.declaration_signature = Some(name.to_string());
        c
    }

    pub fn package(name: &str) -> Self {
        let mut c = Self::new(CompletionKind::PackageRef, name);
        c.declaration_signature = Some(name.to_string());
        c
    }

    /// A type named `qualified`, inserted as `completion`.
    pub fn type_ref(qualified: &str, package: &str, completion: String) -> Self {
        let simple = qualified.rsplit('.').next().unwrap_or(qualified);
        let mut c = Self::new(CompletionKind::TypeRef, simple);
        c.completion = completion;
        c.declaration_signature = Some(package.to_string());
        c.signature = Some(format!("L{qualified};"));
        c
    }

    pub fn field(name: &str, owner_signature: String, signature: String) -> Self {
        let mut c = Self::new(CompletionKind::FieldRef, name);
        c.declaration_signature = Some(owner_signature);
        c.signature = Some(signature);
        c
    }

    pub fn method(
        name: &str,
        owner_signature: String,
        signature: String,
        parameter_names: Vec<String>,
    ) -> Self {
        let mut c = Self::new(CompletionKind::MethodRef, name);
        c.completion = format!("{name}()");
        c.declaration_signature = Some(owner_signature);
        c.signature = Some(signature);
        c.parameter_names = Some(parameter_names);
        c
    }

    pub fn local(name: &str, signature: Option<String>) -> Self {
        let mut c = Self::new(CompletionKind::LocalVariableRef, name);
        c.signature = signature;
        c
    }

    pub fn annotation_attribute(name: &str, owner_signature: String, signature: String) -> Self {
        let mut c = Self::new(CompletionKind::AnnotationAttributeRef, name);
        c.declaration_signature = Some(owner_signature);
        c.signature = Some(signature);
        c
    }

    #[must_use]
    pub fn with_relevance(mut self, relevance: i32) -> Self {
        self.relevance += relevance;
        self
    }

    pub fn finish(self, relevance: i32, replace_range: TextRange) -> Proposal {
        Proposal {
            kind: self.kind,
            name: self.name,
            completion: self.completion,
            declaration_signature: self.declaration_signature,
            signature: self.signature,
            parameter_names: self.parameter_names,
            relevance,
            replace_range,
        }
    }
}

/// Deduplicate and order proposals: relevance descending, then name
/// ascending; remaining ties keep collection order.
///
/// Duplicates share kind, name, declaring context and signature; the most
/// relevant one survives in the position of the first.
pub fn rank(proposals: Vec<Proposal>) -> Vec<Proposal> {
    let mut index: HashMap<(CompletionKind, String, Option<String>, Option<String>), usize> =
        HashMap::new();
    let mut out: Vec<Proposal> = Vec::with_capacity(proposals.len());
    for proposal in proposals {
        let key = (
            proposal.kind,
            proposal.name.clone(),
            proposal.declaration_signature.clone(),
            proposal.signature.clone(),
        );
        match index.get(&key) {
            Some(&at) => {
                if proposal.relevance > out[at].relevance {
                    out[at] = proposal;
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(proposal);
            }
        }
    }
    out.sort_by(|a, b| b.relevance.cmp(&a.relevance).then_with(|| a.name.cmp(&b.name)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_core::TextSize;
    use pretty_assertions::assert_eq;

    fn empty() -> TextRange {
        TextRange::empty(TextSize::from(0))
    }

    #[test]
    fn renders_five_and_six_field_records() {
        let keyword = Candidate::keyword("exports").finish(49, empty());
        assert_eq!(
            keyword.to_string(),
            "exports[KEYWORD]{exports, null, null, exports, null, 49}"
        );

        let module = Candidate::module("org.eclipse.foo").finish(49, empty());
        assert_eq!(
            module.to_string(),
            "org.eclipse.foo[MODULE_REF]{org.eclipse.foo, org.eclipse.foo, null, null, 49}"
        );

        let ty = Candidate::type_ref("pack1.CCC", "pack1", "pack1.CCC".into()).finish(39, empty());
        assert_eq!(
            ty.to_string(),
            "CCC[TYPE_REF]{pack1.CCC, pack1, Lpack1.CCC;, null, 39}"
        );

        let method = Candidate::method("foo", "Lp.X;".into(), "(I)V".into(), vec!["x".into()])
            .finish(52, empty());
        assert_eq!(
            method.to_string(),
            "foo[METHOD_REF]{foo(), Lp.X;, (I)V, foo, (x), 52}"
        );
    }

    #[test]
    fn rank_orders_by_relevance_then_name_and_dedups() {
        let proposals = vec![
            Candidate::keyword("uses").finish(49, empty()),
            Candidate::keyword("exports").finish(49, empty()),
            Candidate::package("p").finish(39, empty()),
            Candidate::keyword("exports").finish(40, empty()),
            Candidate::package("p").finish(52, empty()),
        ];
        let names: Vec<_> = rank(proposals)
            .into_iter()
            .map(|p| (p.name, p.relevance))
            .collect();
        assert_eq!(
            names,
            [
                ("p".to_string(), 52),
                ("exports".to_string(), 49),
                ("uses".to_string(), 49)
            ]
        );
    }
}
