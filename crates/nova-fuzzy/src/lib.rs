//! Name matching primitives used by completion and search.
//!
//! Matching is byte oriented: only `A-Z`/`a-z` are case folded and any
//! non-ASCII bytes must match exactly.
//!
//! Completion uses [`match_name`], which classifies how a typed prefix matches
//! a candidate identifier. The classification (rather than a numeric score)
//! is what callers turn into relevance, so the ordering between match kinds is
//! fixed:
//!
//! exact name > prefix > camel case > substring / subword
//!
//! Search uses [`pattern_match`] for `*`/`?` wildcard patterns in addition to
//! the completion matchers.

#![forbid(unsafe_code)]

mod matching;
mod pattern;

pub use matching::{
    camel_case_match, match_name, prefix_match, subword_match, substring_match, word_starts,
    MatchKind, MatchOptions, NameMatch,
};
pub use pattern::{has_wildcards, pattern_match};
