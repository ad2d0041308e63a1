// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Line Index
//!
//! Byte-offset bookkeeping for one source buffer. All public CodeHem
//! coordinates are 1-based lines and columns; this is where they map to and
//! from byte offsets for slicing and splicing. Columns count bytes.

use crate::element::ElementRange;

/// Line-start offsets for a buffer, plus its dominant line ending.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first byte of each line. `line_starts[0] == 0`.
    line_starts: Vec<usize>,
    len: usize,
    crlf_lines: usize,
    lf_lines: usize,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        let mut crlf_lines = 0;
        let mut lf_lines = 0;
        let bytes = source.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
                if i > 0 && bytes[i - 1] == b'\r' {
                    crlf_lines += 1;
                } else {
                    lf_lines += 1;
                }
            }
        }
        Self {
            line_starts,
            len: source.len(),
            crlf_lines,
            lf_lines,
        }
    }

    /// Number of lines (a trailing newline does not open a counted line
    /// unless bytes follow it).
    #[must_use]
    pub fn line_count(&self) -> usize {
        if self.line_starts.last() == Some(&self.len) && self.len > 0 {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// The file's dominant line ending; LF wins ties and empty files.
    #[must_use]
    pub fn dominant_line_ending(&self) -> &'static str {
        if self.crlf_lines > self.lf_lines {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Byte offset of the first byte of a 1-based line.
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts
            .get(line - 1)
            .copied()
            .unwrap_or(self.len)
    }

    /// Byte offset one past the last content byte of a 1-based line
    /// (excludes the line terminator).
    #[must_use]
    pub fn line_end(&self, line: usize, source: &str) -> usize {
        let start = self.line_start(line);
        let hard_end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.len);
        let mut end = hard_end;
        let bytes = source.as_bytes();
        while end > start && (bytes[end - 1] == b'\n' || bytes[end - 1] == b'\r') {
            end -= 1;
        }
        end
    }

    /// Map a 1-based (line, col) position to a byte offset.
    #[must_use]
    pub fn offset(&self, line: usize, col: usize) -> usize {
        (self.line_start(line) + col - 1).min(self.len)
    }

    /// Map a byte offset back to a 1-based (line, col) position.
    #[must_use]
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Byte span `[start, end)` covered by an element range.
    #[must_use]
    pub fn span(&self, range: &ElementRange) -> std::ops::Range<usize> {
        self.offset(range.start_line, range.start_col)..self.offset(range.end_line, range.end_col)
    }

    /// The whitespace prefix of a 1-based line.
    #[must_use]
    pub fn indent_of<'s>(&self, line: usize, source: &'s str) -> &'s str {
        let start = self.line_start(line);
        let end = self.line_end(line, source);
        let text = &source[start..end];
        let trimmed = text.trim_start_matches([' ', '\t']);
        &text[..text.len() - trimmed.len()]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SRC: &str = "class C:\n    def f(self):\n        return 1\n";

    #[test]
    fn line_offsets_round_trip() {
        let index = LineIndex::new(SRC);
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_start(1), 0);
        assert_eq!(index.line_start(2), 9);
        assert_eq!(index.offset(2, 5), 13);
        assert_eq!(index.position(13), (2, 5));
        assert_eq!(&SRC[index.offset(3, 9)..index.line_end(3, SRC)], "return 1");
    }

    #[test]
    fn spans_map_element_ranges() {
        let index = LineIndex::new(SRC);
        let range = ElementRange::new(3, 9, 3, 17);
        assert_eq!(&SRC[index.span(&range)], "return 1");
    }

    #[test]
    fn indent_prefix() {
        let index = LineIndex::new(SRC);
        assert_eq!(index.indent_of(1, SRC), "");
        assert_eq!(index.indent_of(2, SRC), "    ");
        assert_eq!(index.indent_of(3, SRC), "        ");
    }

    #[test]
    fn dominant_line_ending_detection() {
        assert_eq!(LineIndex::new("a\nb\n").dominant_line_ending(), "\n");
        assert_eq!(LineIndex::new("a\r\nb\r\n").dominant_line_ending(), "\r\n");
        assert_eq!(LineIndex::new("").dominant_line_ending(), "\n");
    }

    #[test]
    fn position_past_end_clamps() {
        let index = LineIndex::new("ab");
        assert_eq!(index.offset(9, 9), 2);
        assert_eq!(index.position(99), (1, 3));
    }
}
