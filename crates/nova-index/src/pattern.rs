//! Search patterns and match rules.

use nova_fuzzy::{camel_case_match, has_wildcards, pattern_match, prefix_match};
use nova_types::{TypeArg, TypeSig, TypeSigParseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of element a textual pattern denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFor {
    Type,
    Method,
    Constructor,
    Field,
    Package,
    Module,
}

/// Which occurrences of the matching elements are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitTo {
    Declarations,
    References,
    AllOccurrences,
    Implementors,
    ReadAccesses,
    WriteAccesses,
    SupertypeTypeReference,
    PermittypeTypeReference,
}

impl LimitTo {
    pub fn includes_declarations(self) -> bool {
        matches!(self, LimitTo::Declarations | LimitTo::AllOccurrences)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    Prefix,
    /// `*` and `?` wildcards.
    Pattern,
    CamelCase,
}

/// How names are compared and which generic accuracies are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRule {
    pub mode: MatchMode,
    pub case_sensitive: bool,
    /// Report matches whose type arguments only agree after erasure.
    pub erasure: bool,
    /// Report matches whose type arguments are compatible through wildcards.
    pub equivalent: bool,
}

impl Default for MatchRule {
    fn default() -> Self {
        Self {
            mode: MatchMode::Exact,
            case_sensitive: true,
            erasure: true,
            equivalent: true,
        }
    }
}

impl MatchRule {
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Only exact (and raw-exact) matches.
    pub fn full_match(mut self) -> Self {
        self.erasure = false;
        self.equivalent = false;
        self
    }

    pub fn matches(&self, pattern: &str, name: &str) -> bool {
        match self.mode {
            MatchMode::Exact => {
                if self.case_sensitive {
                    pattern == name
                } else {
                    pattern.eq_ignore_ascii_case(name)
                }
            }
            MatchMode::Prefix => {
                if self.case_sensitive {
                    name.starts_with(pattern)
                } else {
                    prefix_match(pattern, name)
                }
            }
            MatchMode::Pattern => pattern_match(pattern, name, self.case_sensitive),
            MatchMode::CamelCase => {
                camel_case_match(pattern, name)
                    || if self.case_sensitive {
                        name.starts_with(pattern)
                    } else {
                        prefix_match(pattern, name)
                    }
            }
        }
    }

    /// Match a possibly qualified pattern name against a qualified name.
    ///
    /// A simple pattern ignores the qualifier; a qualified pattern matches the
    /// qualifier with the same rule, except that `CamelCase` and `Prefix` only
    /// apply to the last segment.
    pub fn matches_qualified(&self, pattern: &str, qualified: &str) -> bool {
        let (name_qualifier, name) = split_last(qualified);
        match split_last(pattern) {
            ("", simple) => self.matches(simple, name),
            (qualifier, simple) => {
                let qualifier_rule = match self.mode {
                    MatchMode::Pattern => *self,
                    _ => self.with_mode(MatchMode::Exact),
                };
                qualifier_rule.matches(qualifier, name_qualifier) && self.matches(simple, name)
            }
        }
    }
}

fn split_last(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or(("", name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    Type {
        /// Simple or qualified name, possibly with wildcards.
        name: String,
        type_args: Vec<TypeArg>,
    },
    Method {
        declaring_type: Option<String>,
        name: String,
        /// `None` matches any parameter list.
        params: Option<Vec<TypeSig>>,
        type_args: Vec<TypeArg>,
    },
    Constructor {
        declaring_type: String,
        /// Type arguments of the constructed type.
        type_args: Vec<TypeArg>,
        params: Option<Vec<TypeSig>>,
        method_type_args: Vec<TypeArg>,
    },
    Field {
        declaring_type: Option<String>,
        name: String,
    },
    Package {
        name: String,
    },
    Module {
        name: String,
    },
}

impl PatternKind {
    /// The element name and, when given, its declaring type.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let (name, declaring): (&str, Option<&str>) = match self {
            PatternKind::Type { name, .. }
            | PatternKind::Package { name }
            | PatternKind::Module { name } => (name, None),
            PatternKind::Method {
                declaring_type,
                name,
                ..
            }
            | PatternKind::Field {
                declaring_type,
                name,
            } => (name, declaring_type.as_deref()),
            PatternKind::Constructor { declaring_type, .. } => (declaring_type, None),
        };
        std::iter::once(name).chain(declaring)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern {
    pub kind: PatternKind,
    pub limit_to: LimitTo,
    pub rule: MatchRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty search pattern")]
    Empty,
    #[error("unbalanced `{open}` in `{pattern}`")]
    Unbalanced { open: char, pattern: String },
    #[error("invalid type in search pattern: {source}")]
    InvalidType {
        #[from]
        source: TypeSigParseError,
    },
}

impl SearchPattern {
    pub fn new(kind: PatternKind, limit_to: LimitTo) -> Self {
        Self {
            kind,
            limit_to,
            rule: MatchRule::default(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    /// Parse a textual pattern such as `p.X<String>`, `p.X.foo(int, String)`,
    /// `<T>foo` or `p.X()`.
    ///
    /// Exact rules switch to [`MatchMode::Pattern`] when the name contains
    /// wildcards.
    pub fn parse(
        text: &str,
        search_for: SearchFor,
        limit_to: LimitTo,
        mut rule: MatchRule,
    ) -> Result<Self, PatternError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PatternError::Empty);
        }

        let (method_type_args, rest) = split_leading_type_args(text)?;
        let kind = match search_for {
            SearchFor::Type => {
                let (name, type_args) = split_type_args(rest)?;
                PatternKind::Type { name, type_args }
            }
            SearchFor::Method => {
                let (head, params) = split_params(rest)?;
                let (declaring_type, name) = match head.rsplit_once('.') {
                    Some((owner, name)) => (Some(owner.to_string()), name.to_string()),
                    None => (None, head.to_string()),
                };
                PatternKind::Method {
                    declaring_type,
                    name,
                    params,
                    type_args: method_type_args,
                }
            }
            SearchFor::Constructor => {
                let (head, params) = split_params(rest)?;
                let (declaring_type, type_args) = split_type_args(head)?;
                PatternKind::Constructor {
                    declaring_type,
                    type_args,
                    params,
                    method_type_args,
                }
            }
            SearchFor::Field => match rest.rsplit_once('.') {
                Some((owner, name)) => PatternKind::Field {
                    declaring_type: Some(owner.to_string()),
                    name: name.to_string(),
                },
                None => PatternKind::Field {
                    declaring_type: None,
                    name: rest.to_string(),
                },
            },
            SearchFor::Package => PatternKind::Package {
                name: rest.to_string(),
            },
            SearchFor::Module => PatternKind::Module {
                name: rest.to_string(),
            },
        };

        if rule.mode == MatchMode::Exact && kind.names().any(has_wildcards) {
            rule.mode = MatchMode::Pattern;
        }
        Ok(Self {
            kind,
            limit_to,
            rule,
        })
    }
}

/// `<A, B>rest` into the arguments and `rest`.
fn split_leading_type_args(text: &str) -> Result<(Vec<TypeArg>, &str), PatternError> {
    if !text.starts_with('<') {
        return Ok((Vec::new(), text));
    }
    let close = matching_close(text, 0, '<', '>')?;
    let args = parse_args(&text[..=close])?;
    Ok((args, text[close + 1..].trim_start()))
}

/// `p.X<String>` into `p.X` and its arguments.
fn split_type_args(text: &str) -> Result<(String, Vec<TypeArg>), PatternError> {
    let Some(open) = text.find('<') else {
        return Ok((text.trim().to_string(), Vec::new()));
    };
    let close = matching_close(text, open, '<', '>')?;
    let args = parse_args(&text[open..=close])?;
    Ok((text[..open].trim().to_string(), args))
}

/// `foo(int, String)` into `foo` and the parameter types.
fn split_params(text: &str) -> Result<(&str, Option<Vec<TypeSig>>), PatternError> {
    let Some(open) = text.find('(') else {
        return Ok((text.trim(), None));
    };
    let close = matching_close(text, open, '(', ')')?;
    let inner = text[open + 1..close].trim();
    let mut params = Vec::new();
    if !inner.is_empty() {
        for param in split_top_level(inner) {
            params.push(parse_param(param)?);
        }
    }
    Ok((text[..open].trim(), Some(params)))
}

fn parse_param(text: &str) -> Result<TypeSig, PatternError> {
    let text = text.trim();
    match text.strip_suffix("...") {
        Some(element) => {
            let mut sig = TypeSig::parse(element)?;
            sig.array_dims = sig.array_dims.saturating_add(1);
            Ok(sig)
        }
        None => Ok(TypeSig::parse(text)?),
    }
}

/// Parse `<...>` by attaching it to a placeholder type name.
fn parse_args(bracketed: &str) -> Result<Vec<TypeArg>, PatternError> {
    Ok(TypeSig::parse(&format!("T{bracketed}"))?.args)
}

fn matching_close(text: &str, open_at: usize, open: char, close: char) -> Result<usize, PatternError> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices().skip_while(|(idx, _)| *idx < open_at) {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Ok(idx);
            }
        }
    }
    Err(PatternError::Unbalanced {
        open,
        pattern: text.to_string(),
    })
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                out.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}
