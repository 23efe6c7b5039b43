use std::sync::Arc;

/// A 0-based line and UTF-16 column, the unit editors speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
    pub line: u32,
    pub character: u32,
}

impl LineCol {
    pub fn new(line: u32, character: u32) -> Self {
        LineCol { line, character }
    }
}

/// Maps byte offsets to editor positions and back.
///
/// Built once per source snapshot; all lookups are binary searches over the
/// recorded line starts plus a scan of a single line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: Arc<str>) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end, and
    /// offsets inside a multi-byte character snap to its first byte.
    pub fn line_col(&self, offset: usize) -> LineCol {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        LineCol {
            line: line as u32,
            character: utf16_len(&self.text[start..offset]),
        }
    }

    /// Byte offset of a position. Lines past the end clamp to the end of the
    /// text; columns past the end of a line clamp to the end of that line.
    pub fn offset(&self, pos: LineCol) -> usize {
        let line = pos.line as usize;
        if line >= self.line_starts.len() {
            return self.text.len();
        }
        let start = self.line_starts[line];
        let mut units = 0u32;
        for (i, ch) in self.text[start..].char_indices() {
            if ch == '\n' || units >= pos.character {
                return start + i;
            }
            units += ch.len_utf16() as u32;
            if units > pos.character {
                // The position points into the middle of a surrogate pair.
                return start + i;
            }
        }
        self.text.len()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub fn utf16_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16() as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(text: &str) -> LineIndex {
        LineIndex::new(Arc::from(text))
    }

    #[test]
    fn test_line_col_ascii() {
        let idx = index("module M {\n  control {}\n}\n");
        assert_eq!(idx.line_col(0), LineCol::new(0, 0));
        assert_eq!(idx.line_col(13), LineCol::new(1, 2));
        assert_eq!(idx.line_count(), 4);
    }

    #[test]
    fn test_utf16_columns() {
        // 'ä' is two bytes and one UTF-16 unit, the emoji four bytes and two units.
        let idx = index("ä😀x");
        assert_eq!(idx.line_col(2), LineCol::new(0, 1));
        assert_eq!(idx.line_col(6), LineCol::new(0, 3));
        assert_eq!(idx.offset(LineCol::new(0, 3)), 6);
        assert_eq!(idx.offset(LineCol::new(0, 1)), 2);
    }

    #[test]
    fn test_offset_clamps() {
        let idx = index("ab\ncd");
        assert_eq!(idx.offset(LineCol::new(0, 10)), 2);
        assert_eq!(idx.offset(LineCol::new(7, 0)), 5);
        assert_eq!(idx.offset(LineCol::new(1, 1)), 4);
    }
}
