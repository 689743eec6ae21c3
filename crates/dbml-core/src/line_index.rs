//! Line index for converting byte offsets to line/column positions.

use crate::span::Position;

/// Line index for a source text.
///
/// Caches line start positions for efficient position conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    source: String,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            source: source.to_string(),
        }
    }

    /// Convert a byte offset to a 1-based (line, column) position.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to the
    /// end of the text.
    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        let column = self.source[line_start..offset].chars().count();
        Position::new(line as u32 + 1, column as u32 + 1)
    }

    /// Convert a 1-based position back to a byte offset.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line = position.line.checked_sub(1)? as usize;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.source.len());
        let column = position.column.checked_sub(1)? as usize;
        let offset = self.source[line_start..line_end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| line_start + i)
            .unwrap_or(line_end);
        Some(offset)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn text(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        let index = LineIndex::new("Table users {}");
        assert_eq!(index.position(0), Position::new(1, 1));
        assert_eq!(index.position(6), Position::new(1, 7));
    }

    #[test]
    fn test_position_after_newline() {
        let index = LineIndex::new("a\nbc\n");
        assert_eq!(index.position(2), Position::new(2, 1));
        assert_eq!(index.position(3), Position::new(2, 2));
        assert_eq!(index.position(5), Position::new(3, 1));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn test_position_counts_characters() {
        let index = LineIndex::new("'é' x");
        // 'é' is two bytes; `x` sits at byte 5 but column 5.
        assert_eq!(index.position(5), Position::new(1, 5));
    }

    #[test]
    fn test_offset_roundtrip() {
        let source = "Table a {\n  id int\n}\n";
        let index = LineIndex::new(source);
        for offset in [0, 4, 10, 12, 19] {
            let position = index.position(offset);
            assert_eq!(index.offset(position), Some(offset));
        }
    }

    #[test]
    fn test_offset_clamps_past_end() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(100), Position::new(1, 3));
    }
}
