//! Text model primitives: sizes, ranges and line/column conversions.

pub use text_size::{TextRange, TextSize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Pre-computed line start offsets for a particular text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    line_ends: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![TextSize::from(0)];
        let mut line_ends = Vec::new();

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    let width = if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + width) as u32));
                    i += width;
                }
                _ => i += 1,
            }
        }
        line_ends.push(TextSize::from(text.len() as u32));

        Self {
            line_starts,
            line_ends,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    fn line_index(&self, offset: TextSize) -> usize {
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        }
    }

    /// Convert a byte offset to a zero-based (line, byte column) pair.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.text_len);
        let line = self.line_index(offset);
        let col = offset.min(self.line_ends[line]) - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: u32::from(col),
        }
    }

    /// Convert a zero-based (line, byte column) pair to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let start = *self.line_starts.get(line_col.line as usize)?;
        let end = *self.line_ends.get(line_col.line as usize)?;
        let offset = start + TextSize::from(line_col.col);
        (offset <= end).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn converts_offsets_across_line_endings() {
        let text = "module a {\r\n  requires b;\n}";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 3);

        let offset = TextSize::from(text.find("requires").unwrap() as u32);
        let lc = index.line_col(offset);
        assert_eq!(lc, LineCol { line: 1, col: 2 });
        assert_eq!(index.offset(lc), Some(offset));
        assert_eq!(index.offset(LineCol { line: 0, col: 99 }), None);
    }

    proptest! {
        #[test]
        fn line_col_round_trips(text in "[a-z \n]{0,64}", raw in 0usize..65) {
            let offset = TextSize::from(raw.min(text.len()) as u32);
            let index = LineIndex::new(&text);
            prop_assert_eq!(index.offset(index.line_col(offset)), Some(offset));
        }
    }
}
