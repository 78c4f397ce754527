use serde::Serialize;
use std::fmt;

/// A resolved position in the authored source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, counted in bytes.
    pub column: u32,
    /// The text of the line, trimmed.
    pub snippet: String,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.snippet)
    }
}

/// The authored source file together with an index of where each line starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

impl SourceText {
    /// Indexes `text` by line.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self { text, line_starts }
    }

    /// Returns the full text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the 1-based line `line` without its line terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self.line_starts.get(line).map_or(self.text.len(), |next| next - 1);
        let text = self.text.get(start..end)?;
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    /// Converts a byte offset into a 1-based line and column.
    ///
    /// Returns `None` if `offset` lies past the end of the text.
    pub fn line_column(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.text.len() {
            return None;
        }
        let line = self.line_starts.partition_point(|start| *start <= offset);
        Some((line, offset - self.line_starts[line - 1] + 1))
    }

    /// Resolves a byte offset into a [`SourceLocation`].
    pub fn location(&self, offset: usize) -> Option<SourceLocation> {
        let (line, column) = self.line_column(offset)?;
        let snippet = self.line(line)?.trim().to_string();
        Some(SourceLocation {
            line: u32::try_from(line).ok()?,
            column: u32::try_from(column).ok()?,
            snippet,
        })
    }

    /// Returns the lines `start..=end` (1-based) joined by `\n`.
    pub fn lines(&self, start: usize, end: usize) -> Option<String> {
        (start..=end).map(|line| self.line(line)).collect::<Option<Vec<_>>>().map(|v| v.join("\n"))
    }
}
