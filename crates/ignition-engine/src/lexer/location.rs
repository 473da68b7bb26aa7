//! Source locations for diagnostics.

use std::fmt;
use std::sync::Arc;

use super::Span;

/// File name used when source text has no backing file.
pub const ANONYMOUS_FILE: &str = "<anonymous>";

/// A position in a source file (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// The file the source came from
    pub file: Arc<str>,
    /// Line number, starting at 1
    pub line: u32,
    /// Column number in characters, starting at 1
    pub column: u32,
}

impl SourceLocation {
    /// Creates a new location.
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new(ANONYMOUS_FILE, 1, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Maps byte offsets to line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    file: Arc<str>,
    /// Byte offset of the first character of every line
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Builds the index for `source`.
    pub fn new(source: &'a str, file: impl Into<Arc<str>>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            file: file.into(),
            line_starts,
        }
    }

    /// Resolves the start of `span` to a location.
    pub fn locate(&self, span: Span) -> SourceLocation {
        let offset = span.start.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.chars().count());

        SourceLocation {
            file: Arc::clone(&self.file),
            line: line as u32 + 1,
            column: column as u32 + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        let index = LineIndex::new("var a = 1;", "main.js");
        let loc = index.locate(Span::new(4, 5));
        assert_eq!(loc, SourceLocation::new("main.js", 1, 5));
    }

    #[test]
    fn test_later_lines() {
        let index = LineIndex::new("var a = 1;\n  var b = a;\n", "main.js");
        assert_eq!(index.locate(Span::new(11, 12)).line, 2);
        assert_eq!(index.locate(Span::new(13, 16)).column, 3);
    }

    #[test]
    fn test_offset_at_line_start() {
        let index = LineIndex::new("a\nb", ANONYMOUS_FILE);
        let loc = index.locate(Span::new(2, 3));
        assert_eq!((loc.line, loc.column), (2, 1));
    }

    #[test]
    fn test_display() {
        let loc = SourceLocation::new("x.js", 3, 7);
        assert_eq!(loc.to_string(), "x.js:3:7");
    }
}
