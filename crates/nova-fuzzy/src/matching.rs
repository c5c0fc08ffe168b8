use serde::{Deserialize, Serialize};

/// Which matchers are enabled for a query.
///
/// Passed explicitly with every query; there is no process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Reject matches that only hold when ignoring case.
    pub case_sensitive: bool,
    /// `NPE` matches `NullPointerException`.
    pub camel_case: bool,
    /// `list` matches `addListener`.
    pub substring: bool,
    /// `addlistener` matches `addXListener`.
    pub subword: bool,
}

impl MatchOptions {
    #[must_use]
    pub fn with_subword(mut self, enabled: bool) -> Self {
        self.subword = enabled;
        self
    }

    #[must_use]
    pub fn with_substring(mut self, enabled: bool) -> Self {
        self.substring = enabled;
        self
    }

    #[must_use]
    pub fn with_camel_case(mut self, enabled: bool) -> Self {
        self.camel_case = enabled;
        self
    }

    #[must_use]
    pub fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }
}

/// How a typed prefix matched a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameMatch {
    /// The candidate is exactly the prefix.
    ExactName { case_sensitive: bool },
    /// The candidate starts with the prefix.
    Prefix { case_sensitive: bool },
    CamelCase,
    Substring,
    Subword,
}

/// Coarse classification of a [`NameMatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKind {
    Subword,
    Substring,
    CamelCase,
    CaseInsensitive,
    Exact,
}

impl NameMatch {
    pub fn kind(self) -> MatchKind {
        match self {
            NameMatch::ExactName { case_sensitive: true }
            | NameMatch::Prefix { case_sensitive: true } => MatchKind::Exact,
            NameMatch::ExactName { case_sensitive: false }
            | NameMatch::Prefix { case_sensitive: false } => MatchKind::CaseInsensitive,
            NameMatch::CamelCase => MatchKind::CamelCase,
            NameMatch::Substring => MatchKind::Substring,
            NameMatch::Subword => MatchKind::Subword,
        }
    }

    /// `true` for matches where the candidate starts with the prefix.
    pub fn is_prefix(self) -> bool {
        matches!(self, NameMatch::ExactName { .. } | NameMatch::Prefix { .. })
    }
}

#[inline]
fn fold_byte(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

fn eq_ignore_case(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| fold_byte(x) == fold_byte(y))
}

fn starts_with_case_insensitive(candidate: &[u8], query: &[u8]) -> bool {
    query.len() <= candidate.len() && eq_ignore_case(&candidate[..query.len()], query)
}

/// Classify how `prefix` matches `candidate`, or `None` if it does not match
/// under `options`.
pub fn match_name(prefix: &str, candidate: &str, options: &MatchOptions) -> Option<NameMatch> {
    let p = prefix.as_bytes();
    let c = candidate.as_bytes();

    if p.is_empty() {
        return Some(NameMatch::Prefix {
            case_sensitive: true,
        });
    }

    if p == c {
        return Some(NameMatch::ExactName {
            case_sensitive: true,
        });
    }
    if c.starts_with(p) {
        return Some(NameMatch::Prefix {
            case_sensitive: true,
        });
    }
    if !options.case_sensitive {
        if eq_ignore_case(p, c) {
            return Some(NameMatch::ExactName {
                case_sensitive: false,
            });
        }
        if starts_with_case_insensitive(c, p) {
            return Some(NameMatch::Prefix {
                case_sensitive: false,
            });
        }
    }

    if options.camel_case && camel_case_match(prefix, candidate) {
        return Some(NameMatch::CamelCase);
    }
    if options.substring && substring_match(prefix, candidate, options.case_sensitive) {
        return Some(NameMatch::Substring);
    }
    if options.subword && subword_match(prefix, candidate) {
        return Some(NameMatch::Subword);
    }
    None
}

/// Case-insensitive prefix test.
pub fn prefix_match(prefix: &str, candidate: &str) -> bool {
    starts_with_case_insensitive(candidate.as_bytes(), prefix.as_bytes())
}

/// `true` if `needle` occurs anywhere in `haystack`.
pub fn substring_match(needle: &str, haystack: &str, case_sensitive: bool) -> bool {
    let n = needle.as_bytes();
    let h = haystack.as_bytes();
    if n.is_empty() {
        return true;
    }
    if case_sensitive {
        return haystack.contains(needle);
    }
    h.windows(n.len()).any(|window| eq_ignore_case(window, n))
}

#[inline]
fn is_hump(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit()
}

/// Camel-case matching.
///
/// The first character must match exactly. Upper-case (and digit) pattern
/// characters jump forward to the next matching hump of the candidate;
/// lower-case pattern characters must continue the current hump.
pub fn camel_case_match(pattern: &str, candidate: &str) -> bool {
    let p = pattern.as_bytes();
    let c = candidate.as_bytes();
    if p.is_empty() {
        return true;
    }
    if c.is_empty() || p[0] != c[0] {
        return false;
    }

    let (mut i, mut j) = (1, 1);
    while i < p.len() {
        let pc = p[i];
        if is_hump(pc) {
            loop {
                if j >= c.len() {
                    return false;
                }
                let cc = c[j];
                j += 1;
                if is_hump(cc) && cc == pc {
                    break;
                }
            }
        } else {
            if j >= c.len() || c[j] != pc {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// Word start flags for `candidate`.
///
/// A word starts at index 0, at an upper-case letter following a lower-case
/// letter or digit, at the last capital of an acronym run that is followed by
/// a lower-case letter (`XMLParser` -> `XML`, `Parser`), at a digit run, and
/// after `_`, `$` or `.`.
pub fn word_starts(candidate: &str) -> Vec<bool> {
    let c = candidate.as_bytes();
    let mut starts = Vec::with_capacity(c.len());
    for (i, &b) in c.iter().enumerate() {
        if i == 0 {
            starts.push(true);
            continue;
        }
        let prev = c[i - 1];
        let next = c.get(i + 1).copied();
        let boundary = matches!(prev, b'_' | b'$' | b'.')
            || (b.is_ascii_uppercase() && (prev.is_ascii_lowercase() || prev.is_ascii_digit()))
            || (b.is_ascii_uppercase()
                && prev.is_ascii_uppercase()
                && next.is_some_and(|n| n.is_ascii_lowercase()))
            || (b.is_ascii_digit() && !prev.is_ascii_digit())
            || (b.is_ascii_alphabetic() && prev.is_ascii_digit());
        starts.push(boundary && !matches!(b, b'_' | b'$' | b'.'));
    }
    starts
}

/// Subword matching.
///
/// `pattern` is split into fragments that are each matched contiguously
/// (ignoring case) starting at a word start of `candidate`, in order. Words of
/// the candidate may be skipped: `addlistener` matches `addXListener`.
pub fn subword_match(pattern: &str, candidate: &str) -> bool {
    let p = pattern.as_bytes();
    let c = candidate.as_bytes();
    if p.is_empty() {
        return true;
    }
    let starts = word_starts(candidate);
    let mut failed = vec![false; (p.len() + 1) * (c.len() + 1)];
    subword_from(p, c, &starts, 0, 0, &mut failed)
}

fn subword_from(
    p: &[u8],
    c: &[u8],
    starts: &[bool],
    pi: usize,
    from: usize,
    failed: &mut [bool],
) -> bool {
    if pi == p.len() {
        return true;
    }
    let slot = pi * (c.len() + 1) + from;
    if failed[slot] {
        return false;
    }

    for s in from..c.len() {
        if !starts[s] {
            continue;
        }
        let mut len = 0;
        while pi + len < p.len() && s + len < c.len() && fold_byte(p[pi + len]) == fold_byte(c[s + len])
        {
            len += 1;
        }
        for take in (1..=len).rev() {
            if subword_from(p, c, starts, pi + take, s + take, failed) {
                return true;
            }
        }
    }

    failed[slot] = true;
    false
}
