//! Source files and positions for diagnostics
//!
//! Files are registered once and addressed by [`FileId`]. Positions are
//! 1-based line/column pairs plus the 0-based byte offset they came from.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
    pub file_id: FileId,
}

impl SourceSpan {
    pub fn new(start: SourcePosition, end: SourcePosition, file_id: FileId) -> Self {
        Self { start, end, file_id }
    }

    /// One-character span at `pos`
    pub fn point(pos: SourcePosition, file_id: FileId) -> Self {
        Self {
            start: pos,
            end: SourcePosition::new(pos.line, pos.column + 1, pos.byte_offset + 1),
            file_id,
        }
    }

    /// Smallest span covering both; `None` for spans of different files
    pub fn merge(self, other: SourceSpan) -> Option<SourceSpan> {
        if self.file_id != other.file_id {
            return None;
        }
        let start = if self.start.byte_offset <= other.start.byte_offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.byte_offset >= other.end.byte_offset {
            self.end
        } else {
            other.end
        };
        Some(SourceSpan::new(start, end, self.file_id))
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

impl FileId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            content,
            line_starts,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 1-based line, without its terminator
    pub fn line(&self, line_number: usize) -> Option<&str> {
        let start = *self.line_starts.get(line_number.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.content.len());
        self.content
            .get(start..end)
            .map(|text| text.trim_end_matches(['\n', '\r']))
    }

    /// Byte offset to 1-based line and column; offsets past the end clamp to it
    pub fn position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.content.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_index];
        SourcePosition::new(line_index + 1, offset - line_start + 1, offset)
    }

    /// Byte offset of a 1-based line and column, if the line exists
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        Some((start + column.saturating_sub(1)).min(self.content.len()))
    }
}

/// All files of one compilation
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile::new(name, content));
        id
    }

    pub fn get_file(&self, file_id: FileId) -> Option<&SourceFile> {
        self.files.get(file_id.0)
    }

    pub fn get_line(&self, file_id: FileId, line_number: usize) -> Option<&str> {
        self.get_file(file_id)?.line(line_number)
    }

    pub fn span_from_offsets(&self, file_id: FileId, start: usize, end: usize) -> Option<SourceSpan> {
        let file = self.get_file(file_id)?;
        Some(SourceSpan::new(file.position(start), file.position(end), file_id))
    }

    /// One-character span at a 1-based line and column
    pub fn span_at(&self, file_id: FileId, line: usize, column: usize) -> Option<SourceSpan> {
        let offset = self.get_file(file_id)?.offset_of(line, column)?;
        Some(SourceSpan::point(SourcePosition::new(line, column, offset), file_id))
    }

    pub fn file_name(&self, file_id: FileId) -> Option<&str> {
        self.get_file(file_id).map(|f| f.name.as_str())
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.files.len()).map(FileId)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let mut map = SourceMap::new();
        let file = map.add_file("run.ceylon", "shared void run() {\r\n    print(1);\n}");
        assert_eq!(map.get_line(file, 1), Some("shared void run() {"));
        assert_eq!(map.get_line(file, 2), Some("    print(1);"));
        assert_eq!(map.get_line(file, 3), Some("}"));
        assert_eq!(map.get_line(file, 0), None);
        assert_eq!(map.get_line(file, 4), None);
    }

    #[test]
    fn test_positions() {
        let file = SourceFile::new("a.ceylon", "abc\ndef\n");
        assert_eq!(file.position(0), SourcePosition::new(1, 1, 0));
        assert_eq!(file.position(5), SourcePosition::new(2, 2, 5));
        assert_eq!(file.position(100).byte_offset, 8);
        assert_eq!(file.offset_of(2, 2), Some(5));
        assert_eq!(file.offset_of(9, 1), None);
    }

    #[test]
    fn test_span_at() {
        let mut map = SourceMap::new();
        let file = map.add_file("a.ceylon", "value x = 1;\nvalue y = x;");
        let span = map.span_at(file, 2, 7).unwrap();
        assert_eq!(span.start.byte_offset, 19);
        assert_eq!(span.end.column, 8);
        assert!(map.span_at(FileId::new(3), 1, 1).is_none());
    }

    #[test]
    fn test_merge() {
        let file = FileId::new(0);
        let a = SourceSpan::new(SourcePosition::new(1, 1, 0), SourcePosition::new(1, 5, 4), file);
        let b = SourceSpan::new(SourcePosition::new(1, 3, 2), SourcePosition::new(1, 8, 7), file);
        let merged = a.merge(b).unwrap();
        assert_eq!(merged.start.byte_offset, 0);
        assert_eq!(merged.end.byte_offset, 7);

        let elsewhere = SourceSpan::point(SourcePosition::new(1, 1, 0), FileId::new(1));
        assert!(a.merge(elsewhere).is_none());
    }

    #[test]
    fn test_multiple_files() {
        let mut map = SourceMap::new();
        let first = map.add_file("first.ceylon", "");
        let second = map.add_file("second.ceylon", "");
        assert_eq!(map.len(), 2);
        assert_ne!(first, second);
        assert_eq!(map.file_name(second), Some("second.ceylon"));
        assert_eq!(map.file_ids().collect::<Vec<_>>(), vec![first, second]);
    }
}
