use std::fmt;

use crate::error::EditorError;

/// Represents the result of reading an item from the reader.
///
/// - `Ok(Some(item))` when an item was read
/// - `Ok(None)` when the source is exhausted
/// - `Err(error)` when the next item could not be produced
pub type ItemReaderResult<I> = Result<Option<I>, EditorError>;

/// Represents the result of writing items to the writer.
pub type ItemWriterResult = Result<(), EditorError>;

/// A non-fatal problem met while reading a row. The row is either skipped or
/// kept with defaulted fields, and reading goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    /// 1-based line of the row in the source, 0 when unknown.
    pub line: u64,
    pub message: String,
}

impl RowWarning {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A source of items, read one at a time.
pub trait ItemReader<I> {
    fn read(&self) -> ItemReaderResult<I>;

    /// Drains the warnings collected on rows that were still returned.
    fn take_warnings(&self) -> Vec<RowWarning> {
        Vec::new()
    }
}

/// A destination of items, written one batch at a time.
pub trait ItemWriter<O> {
    fn write(&self, items: &[O]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
