use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A single Java identifier (simple name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(SmolStr);

impl Name {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

/// A dotted Java name (`java.util.List`, `org.astro`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn from_dotted(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = String::new();
        for seg in segments {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(seg);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|seg| !seg.is_empty())
    }

    pub fn last(&self) -> &str {
        simple_name_of(&self.0)
    }

    /// Everything before the last segment, or `""` for a single segment name.
    pub fn qualifier(&self) -> &str {
        package_of(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        QualifiedName::from_dotted(value)
    }
}

/// The qualifier of a dotted name (`java.util` for `java.util.List`).
pub fn package_of(dotted: &str) -> &str {
    dotted.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
}

/// The last segment of a dotted name (`List` for `java.util.List`).
pub fn simple_name_of(dotted: &str) -> &str {
    dotted.rsplit_once('.').map(|(_, name)| name).unwrap_or(dotted)
}

const KEYWORDS: &[&str] = &[
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "try",
    "void",
    "volatile",
    "while",
    "true",
    "false",
    "null",
    "_",
];

/// Reserved words (including the literals `true`, `false`, `null`).
///
/// Contextual keywords (`module`, `requires`, `record`, ...) are not reserved.
pub fn is_java_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// ASCII-plus-Unicode-letter identifier check.
pub fn is_java_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !is_java_keyword(word)
}

/// A module name is a dotted sequence of identifiers (`com.greetings`).
///
/// Project names such as `123`, `my-project` or `a..b` are not valid module names.
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_java_identifier)
}
