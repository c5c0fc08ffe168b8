/// `true` if `pattern` contains `*` or `?`.
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Wildcard match: `*` matches any run (including empty), `?` any single byte.
pub fn pattern_match(pattern: &str, name: &str, case_sensitive: bool) -> bool {
    let p = pattern.as_bytes();
    let n = name.as_bytes();
    let eq = |a: u8, b: u8| {
        if case_sensitive {
            a == b
        } else {
            a.eq_ignore_ascii_case(&b)
        }
    };

    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ni));
            pi += 1;
        } else if pi < p.len() && (p[pi] == b'?' || eq(p[pi], n[ni])) {
            pi += 1;
            ni += 1;
        } else if let Some((star_pi, star_ni)) = star {
            pi = star_pi + 1;
            ni = star_ni + 1;
            star = Some((star_pi, star_ni + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards() {
        assert!(pattern_match("*List", "ArrayList", true));
        assert!(pattern_match("Gen?", "GenA", true));
        assert!(pattern_match("g*", "Gen", false));
        assert!(!pattern_match("g*", "Gen", true));
        assert!(!pattern_match("Gen?", "Gen", true));
        assert!(pattern_match("*", "", true));
        assert!(has_wildcards("X*"));
        assert!(!has_wildcards("X"));
    }
}
