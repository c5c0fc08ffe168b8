//! Utilities shared by Nova tests.
//!
//! Fixtures mark the cursor with `<|>` and selections with `/*start*/` and
//! `/*end*/`; the helpers here strip the markers and report byte offsets into
//! the stripped text.

use std::fmt::Display;
use std::ops::Range;

use nova_core::TextRange;
use nova_project::{Project, Workspace};

/// Cursor marker used by completion fixtures.
pub const CARET: &str = "<|>";

/// Strip the single `<|>` marker from `fixture`, returning the text and the
/// marker's offset.
pub fn extract_caret(fixture: &str) -> (String, usize) {
    let offset = fixture
        .find(CARET)
        .expect("fixture must contain <|> caret marker");
    assert!(
        !fixture[offset + CARET.len()..].contains(CARET),
        "fixture must contain exactly one <|> caret marker"
    );
    (fixture.replacen(CARET, "", 1), offset)
}

/// Extracts a byte range selection from a fixture containing `/*start*/` and
/// `/*end*/` markers.
pub fn extract_range(fixture: &str) -> (String, Range<usize>) {
    let start_marker = "/*start*/";
    let end_marker = "/*end*/";

    let start = fixture
        .find(start_marker)
        .expect("fixture missing /*start*/ marker");
    let after_start = start + start_marker.len();
    let end = fixture
        .find(end_marker)
        .expect("fixture missing /*end*/ marker");
    assert!(end >= after_start, "/*end*/ must come after /*start*/");

    let mut text = String::with_capacity(fixture.len());
    text.push_str(&fixture[..start]);
    text.push_str(&fixture[after_start..end]);
    text.push_str(&fixture[end + end_marker.len()..]);

    // The end shrinks by the length of the start marker.
    (text, start..end - start_marker.len())
}

/// Byte range of the `nth` (0-based) occurrence of `needle` in `text`.
pub fn find_range(text: &str, needle: &str, nth: usize) -> TextRange {
    let start = text
        .match_indices(needle)
        .nth(nth)
        .map(|(at, _)| at)
        .unwrap_or_else(|| panic!("`{needle}` occurs fewer than {} times", nth + 1));
    TextRange::new(
        (start as u32).into(),
        ((start + needle.len()) as u32).into(),
    )
}

/// One item per line, the way expected results are written in tests.
pub fn lines<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Workspace of `projects` where project `owner` also holds `fixture` at
/// `path`, stripped of its caret. Returns the workspace and the caret offset.
pub fn workspace_with_caret(
    mut projects: Vec<Project>,
    owner: &str,
    path: &str,
    fixture: &str,
) -> (Workspace, usize) {
    let (text, offset) = extract_caret(fixture);
    let project = projects
        .iter_mut()
        .find(|p| p.name == owner)
        .unwrap_or_else(|| panic!("fixture project `{owner}` missing"));
    project.files.insert(path.to_string(), text);
    (Workspace::new(projects), offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn caret_is_removed() {
        let (text, offset) = extract_caret("module m { re<|> }");
        assert_eq!(text, "module m { re }");
        assert_eq!(offset, 13);
    }

    #[test]
    fn range_markers_are_removed() {
        let (text, range) = extract_range("a /*start*/foo/*end*/ b");
        assert_eq!(text, "a foo b");
        assert_eq!(&text[range], "foo");
    }

    #[test]
    fn nth_occurrence() {
        let range = find_range("foo bar foo", "foo", 1);
        assert_eq!(usize::from(range.start()), 8);
    }

    #[test]
    fn lines_join_with_newlines() {
        assert_eq!(lines(["a", "b"]), "a\nb");
    }
}
