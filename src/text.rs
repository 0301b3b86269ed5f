/// A half-open region of source text, measured in bytes.
///
/// Spans are attached to every token, syntax node and diagnostic so that
/// errors can point back at the exact piece of input they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextSpan {
    /// Byte offset of the first character covered by the span.
    pub start:  usize,
    /// Number of bytes covered by the span.
    pub length: usize,
}

impl TextSpan {
    /// Creates a span from a start offset and a length.
    #[must_use]
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Creates a span covering `[start, end)`.
    ///
    /// # Panics
    /// Panics if `end` is less than `start`; that is a programming error,
    /// not a recoverable condition.
    #[must_use]
    pub fn from_bounds(start: usize, end: usize) -> Self {
        assert!(end >= start, "span end lies before its start");
        Self { start, length: end - start }
    }

    /// The first byte offset past the end of the span.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.length
    }
}

/// An immutable source buffer with a precomputed line index.
///
/// Every stage of the pipeline shares one `SourceText`; tokens and
/// diagnostics store spans into it and resolve human-readable line and
/// column numbers through it.
#[derive(Debug)]
pub struct SourceText {
    text:        String,
    line_starts: Vec<usize>,
}

impl SourceText {
    /// The full program text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the program text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the program text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the zero-based index of the physical line containing the
    /// given byte offset.
    #[must_use]
    pub fn line_index(&self, position: usize) -> usize {
        match self.line_starts.binary_search(&position) {
            Ok(index) => index,
            Err(index) => index - 1,
        }
    }

    /// Resolves a byte offset to a one-based `(line, column)` pair for
    /// diagnostic display.
    #[must_use]
    pub fn line_column(&self, position: usize) -> (usize, usize) {
        let line = self.line_index(position);
        let start = self.line_starts[line];
        let column = self.text[start..position.min(self.text.len())].chars().count();
        (line + 1, column + 1)
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { text: text.to_string(),
               line_starts }
    }
}
