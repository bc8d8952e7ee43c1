//! CSV support for importing and exporting books.
//!
//! The codec turns raw delimited text into [`Book`]s and books back into
//! text. It holds no state besides the cursor of a reader.
//!
//! # Module Architecture
//!
//! 1. **BookCsvReader**: locates the five columns in the header row, then
//!    yields one book per row. Malformed rows never fail the whole
//!    read; they surface as [`RowWarning`]s.
//!
//! 2. **BookCsvWriter**: writes the fixed header row and one line per book,
//!    quoting only the fields that need it.
//!
//! Both components follow the builder pattern and implement the
//! [`ItemReader`](crate::core::item::ItemReader) /
//! [`ItemWriter`](crate::core::item::ItemWriter) traits.
//!
//! # Round trip
//!
//! Reading back what the writer produced gives the same books, field for
//! field, including values holding commas, quotes and line breaks:
//!
//! ```
//! use book_csv_editor::core::book::Book;
//! use book_csv_editor::item::csv::{parse, serialize};
//!
//! let books = vec![
//!     Book::new("Love, Actually", "The \"Author\"", "Multi\nLine", "2003", ""),
//!     Book::new("Emma", "Jane Austen", "Fiction", "1815", "0-306-40615-2"),
//! ];
//!
//! let text = serialize(&books).unwrap();
//! let parsed = parse(&text).unwrap();
//!
//! assert_eq!(parsed.books, books);
//! assert!(parsed.warnings.is_empty());
//! ```

/// A module providing facilities for reading books from CSV.
pub mod csv_reader;

/// A module providing facilities for writing books to CSV.
pub mod csv_writer;

use crate::{
    core::{
        book::Book,
        import::{drain, ImportReport},
        item::ItemWriter,
    },
    error::{EditorError, Result},
};

use self::{csv_reader::BookCsvReaderBuilder, csv_writer::BookCsvWriterBuilder};

pub use crate::core::item::RowWarning;

/// Export name used when the current books do not come from an imported file.
pub const DEFAULT_EXPORT_NAME: &str = "edited_books.csv";

/// A small, valid file showing the expected layout.
pub const SAMPLE_CSV: &str = "Title,Author,Genre,PublishedYear,ISBN
The Great Gatsby,F. Scott Fitzgerald,Fiction,1925,978-0-7432-7356-5
";

/// Parses comma-delimited text with a header row into books.
///
/// A leading byte order mark is ignored.
///
/// # Errors
///
/// [`EditorError::HeaderMismatch`] when a required header is missing. Row
/// level problems are returned as warnings next to the books instead.
pub fn parse(raw: &str) -> Result<ImportReport> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let reader = BookCsvReaderBuilder::new().from_reader(raw.as_bytes())?;
    Ok(drain(&reader, None)?.unwrap_or_default())
}

/// Serializes books to comma-delimited text, header row first, one `\n`
/// terminated line per book.
pub fn serialize(books: &[Book]) -> Result<String> {
    let wtr = BookCsvWriterBuilder::new().from_writer(Vec::new());
    ItemWriter::<Book>::open(&wtr)?;
    wtr.write(books)?;
    let bytes = wtr.into_inner()?;
    String::from_utf8(bytes).map_err(|error| EditorError::ItemWriter(error.to_string()))
}

/// Name of the exported file: `books.csv` becomes `books_edited.csv`, a name
/// without the `.csv` suffix gets `_edited.csv` appended, and no name at all
/// gives [`DEFAULT_EXPORT_NAME`].
pub fn edited_file_name(source: Option<&str>) -> String {
    let Some(source) = source.filter(|name| !name.trim().is_empty()) else {
        return DEFAULT_EXPORT_NAME.to_owned();
    };

    let stem_len = source.len().saturating_sub(4);
    match source.get(stem_len..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(".csv") => {
            format!("{}_edited.csv", &source[..stem_len])
        }
        _ => format!("{}_edited.csv", source),
    }
}
