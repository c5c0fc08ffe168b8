//! Generic accuracy of a match.

use std::fmt;

use nova_types::{names_match, TypeArg, TypeSig};
use serde::{Deserialize, Serialize};

use crate::pattern::MatchRule;

/// Confidence of a match, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Exact,
    Equivalent,
    Erasure,
    /// The reference could not be bound; only its name matches.
    Potential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchAccuracy {
    pub accuracy: Accuracy,
    /// The reference is a raw use of a generic type.
    pub raw: bool,
}

impl MatchAccuracy {
    pub const EXACT: MatchAccuracy = MatchAccuracy::new(Accuracy::Exact, false);
    pub const POTENTIAL: MatchAccuracy = MatchAccuracy::new(Accuracy::Potential, false);

    pub const fn new(accuracy: Accuracy, raw: bool) -> Self {
        Self { accuracy, raw }
    }

    /// The weaker of two accuracies; rawness is sticky.
    #[must_use]
    pub fn combine(self, other: MatchAccuracy) -> MatchAccuracy {
        MatchAccuracy {
            accuracy: self.accuracy.max(other.accuracy),
            raw: self.raw || other.raw,
        }
    }
}

impl fmt::Display for MatchAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.accuracy {
            Accuracy::Exact => "EXACT",
            Accuracy::Equivalent => "EQUIVALENT",
            Accuracy::Erasure => "ERASURE",
            Accuracy::Potential => return f.write_str("POTENTIAL_MATCH"),
        };
        if self.raw {
            write!(f, "{base}_RAW_MATCH")
        } else {
            write!(f, "{base}_MATCH")
        }
    }
}

/// Compare the type arguments of a pattern with those of a reference.
///
/// `generic` tells whether the referenced declaration has type parameters;
/// `is_subtype` answers subtype questions between written type names.
/// Returns `None` when the rule does not accept the resulting accuracy.
pub fn type_args_accuracy(
    pattern: &[TypeArg],
    reference: &[TypeArg],
    generic: bool,
    rule: &MatchRule,
    is_subtype: &dyn Fn(&str, &str) -> bool,
) -> Option<MatchAccuracy> {
    let raw_reference = reference.is_empty() && generic;

    if pattern.is_empty() {
        return Some(MatchAccuracy::new(Accuracy::Exact, raw_reference));
    }

    if raw_reference {
        return if rule.equivalent {
            Some(MatchAccuracy::new(Accuracy::Equivalent, true))
        } else if rule.erasure {
            Some(MatchAccuracy::new(Accuracy::Erasure, true))
        } else {
            None
        };
    }

    let same_arity = pattern.len() == reference.len();
    if same_arity && pattern.iter().zip(reference).all(|(p, r)| args_equal(p, r)) {
        return Some(MatchAccuracy::EXACT);
    }

    let compatible = same_arity
        && pattern
            .iter()
            .zip(reference)
            .all(|(p, r)| args_compatible(p, r, is_subtype));
    if compatible && rule.equivalent {
        return Some(MatchAccuracy::new(Accuracy::Equivalent, false));
    }
    rule.erasure
        .then_some(MatchAccuracy::new(Accuracy::Erasure, false))
}

/// Structural equality where `String` and `java.lang.String` are the same.
pub fn sigs_equal(a: &TypeSig, b: &TypeSig) -> bool {
    names_match(&a.name, &b.name)
        && a.array_dims == b.array_dims
        && a.args.len() == b.args.len()
        && a.args.iter().zip(&b.args).all(|(x, y)| args_equal(x, y))
}

/// Equality after erasure, used for parameter lists.
pub fn erasures_equal(a: &TypeSig, b: &TypeSig) -> bool {
    names_match(&a.name, &b.name) && a.array_dims == b.array_dims
}

fn args_equal(a: &TypeArg, b: &TypeArg) -> bool {
    match (a, b) {
        (TypeArg::Wildcard, TypeArg::Wildcard) => true,
        (TypeArg::Type(x), TypeArg::Type(y))
        | (TypeArg::Extends(x), TypeArg::Extends(y))
        | (TypeArg::Super(x), TypeArg::Super(y)) => sigs_equal(x, y),
        _ => false,
    }
}

fn args_compatible(pattern: &TypeArg, reference: &TypeArg, is_subtype: &dyn Fn(&str, &str) -> bool) -> bool {
    let sub = |a: &TypeSig, b: &TypeSig| names_match(&a.name, &b.name) || is_subtype(&a.name, &b.name);
    match (pattern, reference) {
        (TypeArg::Wildcard, _) | (_, TypeArg::Wildcard) => true,
        (TypeArg::Type(p), TypeArg::Extends(bound)) | (TypeArg::Extends(bound), TypeArg::Type(p)) => {
            sub(p, bound)
        }
        (TypeArg::Type(p), TypeArg::Super(bound)) | (TypeArg::Super(bound), TypeArg::Type(p)) => {
            sub(bound, p)
        }
        (TypeArg::Extends(a), TypeArg::Extends(b)) => sub(a, b) || sub(b, a),
        (TypeArg::Super(a), TypeArg::Super(b)) => sub(a, b) || sub(b, a),
        (TypeArg::Type(a), TypeArg::Type(b)) => sigs_equal(a, b),
        (TypeArg::Extends(_), TypeArg::Super(_)) | (TypeArg::Super(_), TypeArg::Extends(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(text: &str) -> Vec<TypeArg> {
        TypeSig::parse(&format!("T<{text}>")).unwrap().args
    }

    fn label(pattern: &str, reference: &str, generic: bool, rule: MatchRule) -> Option<String> {
        let subtype = |sub: &str, sup: &str| {
            matches!((sub, sup), ("String", "CharSequence") | ("Integer", "Number"))
                || sup == "Object"
        };
        let pattern = if pattern.is_empty() { Vec::new() } else { args(pattern) };
        let reference = if reference.is_empty() { Vec::new() } else { args(reference) };
        type_args_accuracy(&pattern, &reference, generic, &rule, &subtype).map(|a| a.to_string())
    }

    #[test]
    fn accuracy_labels() {
        let rule = MatchRule::default();
        let l = |p, r| label(p, r, true, rule);
        assert_eq!(l("", "String").as_deref(), Some("EXACT_MATCH"));
        assert_eq!(l("", "").as_deref(), Some("EXACT_RAW_MATCH"));
        assert_eq!(l("String", "java.lang.String").as_deref(), Some("EXACT_MATCH"));
        assert_eq!(l("String", "?").as_deref(), Some("EQUIVALENT_MATCH"));
        assert_eq!(l("String", "? extends CharSequence").as_deref(), Some("EQUIVALENT_MATCH"));
        assert_eq!(l("? extends Number", "Integer").as_deref(), Some("EQUIVALENT_MATCH"));
        assert_eq!(l("String", "Exception").as_deref(), Some("ERASURE_MATCH"));
        assert_eq!(l("String", "").as_deref(), Some("EQUIVALENT_RAW_MATCH"));
        assert_eq!(label("", "", false, rule).as_deref(), Some("EXACT_MATCH"));
    }

    #[test]
    fn rule_restricts_accepted_accuracies() {
        let no_equivalent = MatchRule {
            equivalent: false,
            ..MatchRule::default()
        };
        assert_eq!(label("String", "", true, no_equivalent).as_deref(), Some("ERASURE_RAW_MATCH"));
        assert_eq!(label("String", "?", true, no_equivalent).as_deref(), Some("ERASURE_MATCH"));

        let full = MatchRule::default().full_match();
        assert_eq!(label("String", "?", true, full), None);
        assert_eq!(label("String", "", true, full), None);
        assert_eq!(label("String", "String", true, full).as_deref(), Some("EXACT_MATCH"));
    }

    #[test]
    fn combine_keeps_weakest() {
        let erasure = MatchAccuracy::new(Accuracy::Erasure, false);
        let raw_exact = MatchAccuracy::new(Accuracy::Exact, true);
        assert_eq!(erasure.combine(raw_exact).to_string(), "ERASURE_RAW_MATCH");
        assert_eq!(MatchAccuracy::POTENTIAL.to_string(), "POTENTIAL_MATCH");
    }
}
