//! Relevance constants. A proposal's relevance is the sum of the constants
//! whose condition holds; higher sorts first.

use nova_fuzzy::NameMatch;

pub const R_DEFAULT: i32 = 30;
pub const R_RESOLVED: i32 = 1;
pub const R_INTERESTING: i32 = 5;
pub const R_NON_RESTRICTED: i32 = 3;

pub const R_CASE: i32 = 10;
pub const R_EXACT_NAME: i32 = 4;
pub const R_CAMEL_CASE: i32 = 5;
pub const R_SUBSTRING: i32 = -21;
pub const R_SUBWORD: i32 = -21;

pub const R_EXPECTED_TYPE: i32 = 20;
pub const R_EXACT_EXPECTED_TYPE: i32 = 30;
pub const R_CLASS: i32 = 20;
pub const R_INTERFACE: i32 = 20;
pub const R_ANNOTATION: i32 = 20;
pub const R_EXCEPTION: i32 = 20;

pub const R_NON_STATIC: i32 = 11;
pub const R_UNQUALIFIED: i32 = 3;
pub const R_QUALIFIED: i32 = 2;
pub const R_NON_INHERITED: i32 = 2;
pub const R_TRUE_OR_FALSE: i32 = 1;
pub const R_VOID: i32 = -5;

/// Starting relevance of every proposal.
pub const BASE: i32 = R_DEFAULT + R_RESOLVED + R_INTERESTING + R_NON_RESTRICTED;

/// Contribution of how the typed prefix matched the proposal name.
pub fn name_match(m: NameMatch) -> i32 {
    match m {
        NameMatch::ExactName { case_sensitive: true } => R_EXACT_NAME + R_CASE,
        NameMatch::ExactName { case_sensitive: false } => R_EXACT_NAME,
        NameMatch::Prefix { case_sensitive: true } => R_CASE,
        NameMatch::Prefix { case_sensitive: false } => 0,
        NameMatch::CamelCase => R_CAMEL_CASE,
        NameMatch::Substring => R_SUBSTRING,
        NameMatch::Subword => R_SUBWORD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_keywords_score_49_and_mismatched_case_39() {
        assert_eq!(BASE, 39);
        assert_eq!(BASE + name_match(NameMatch::Prefix { case_sensitive: true }), 49);
        assert_eq!(BASE + name_match(NameMatch::Prefix { case_sensitive: false }), 39);
        assert!(
            name_match(NameMatch::ExactName { case_sensitive: true })
                > name_match(NameMatch::ExactName { case_sensitive: false })
        );
        assert!(name_match(NameMatch::Prefix { case_sensitive: false }) > name_match(NameMatch::Subword));
    }
}
