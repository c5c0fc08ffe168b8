use serde::{Deserialize, Serialize};

/// Declared access level of a type or member.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    /// No access modifier ("default" / package-private access).
    #[default]
    Package,
    Protected,
    Public,
}

/// Declaration modifiers relevant for completion, search and resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_sealed: bool,
}

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers {
        visibility: Visibility::Public,
        is_static: false,
        is_abstract: false,
        is_final: false,
        is_sealed: false,
    };

    pub const PACKAGE: Modifiers = Modifiers {
        visibility: Visibility::Package,
        is_static: false,
        is_abstract: false,
        is_final: false,
        is_sealed: false,
    };

    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn set_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn set_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn set_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Parse a modifier keyword, returning `false` for anything else.
    pub fn apply_keyword(&mut self, keyword: &str) -> bool {
        match keyword {
            "public" => self.visibility = Visibility::Public,
            "protected" => self.visibility = Visibility::Protected,
            "private" => self.visibility = Visibility::Private,
            "static" => self.is_static = true,
            "abstract" => self.is_abstract = true,
            "final" => self.is_final = true,
            "sealed" => self.is_sealed = true,
            "non-sealed" | "default" | "synchronized" | "native" | "transient" | "volatile"
            | "strictfp" => {}
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_keywords() {
        let mut modifiers = Modifiers::default();
        assert!(modifiers.apply_keyword("public"));
        assert!(modifiers.apply_keyword("static"));
        assert!(!modifiers.apply_keyword("class"));
        assert_eq!(modifiers.visibility, Visibility::Public);
        assert!(modifiers.is_static);
    }

    #[test]
    fn visibility_orders_from_private_to_public() {
        assert!(Visibility::Private < Visibility::Package);
        assert!(Visibility::Protected < Visibility::Public);
    }
}
