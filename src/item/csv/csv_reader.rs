use csv::{ErrorKind, ReaderBuilder, StringRecord, StringRecordsIntoIter, Terminator, Trim};
use log::debug;
use std::{cell::RefCell, fs::File, io::Read, path::Path};

use crate::{
    core::{
        book::{Book, BookField},
        item::{ItemReader, ItemReaderResult, RowWarning},
    },
    error::{EditorError, Result},
};

/// A CSV reader producing one [`Book`] per data row.
///
/// The header row is read and checked when the reader is built: the columns
/// of the five fields are located once, in any order, and extra columns are
/// ignored.
///
/// Rows are handled leniently:
///
/// - empty lines are skipped; a row of empty fields such as `,,,,` is a book
/// - a row with fewer fields than the header gets empty values for the missing
///   ones, a row with more has the extra ones dropped; either way a
///   [`RowWarning`] is recorded and the book is returned
/// - a row the CSV decoder rejects is reported as [`EditorError::ParseRow`]
///   and reading can go on with the next row
///
/// Field values are not trimmed, so serialized books read back unchanged.
///
/// # Examples
///
/// ```
/// use book_csv_editor::core::item::ItemReader;
/// use book_csv_editor::item::csv::csv_reader::BookCsvReaderBuilder;
///
/// let data = "\
/// ISBN,Title,Author,Genre,PublishedYear,Shelf
/// 978-0-441-17271-9,Dune,Frank Herbert,Science Fiction,1965,B2
/// ";
///
/// let reader = BookCsvReaderBuilder::new()
///     .from_reader(data.as_bytes())
///     .unwrap();
///
/// let book = reader.read().unwrap().unwrap();
/// assert_eq!(book.title, "Dune");
/// assert_eq!(book.isbn, "978-0-441-17271-9");
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct BookCsvReader<R> {
    /// Iterator over the CSV data rows.
    records: RefCell<StringRecordsIntoIter<R>>,
    /// Column of each field, in `BookField::ALL` order.
    columns: [usize; 5],
    /// Number of header columns.
    width: usize,
    warnings: RefCell<Vec<RowWarning>>,
}

impl<R: Read> BookCsvReader<R> {
    fn to_book(&self, record: &StringRecord) -> Book {
        let mut book = Book::default();
        for (field, column) in BookField::ALL.into_iter().zip(self.columns) {
            book.set(field, record.get(column).unwrap_or_default().to_owned());
        }
        book
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |position| position.line())
}

impl<R: Read> ItemReader<Book> for BookCsvReader<R> {
    /// Reads the next row as a book.
    ///
    /// # Returns
    /// - `Ok(Some(book))` for each data row
    /// - `Ok(None)` once every row has been read
    /// - `Err(EditorError::ParseRow(_))` when a row cannot be decoded
    /// - `Err(EditorError::ItemReader(_))` when the underlying source fails
    fn read(&self) -> ItemReaderResult<Book> {
        let Some(result) = self.records.borrow_mut().next() else {
            return Ok(None);
        };

        let record = match result {
            Ok(record) => record,
            Err(error) => {
                let line = error.position().map_or(0, |position| position.line());
                return match error.kind() {
                    ErrorKind::Io(_) => Err(EditorError::ItemReader(error.to_string())),
                    _ => Err(EditorError::ParseRow(RowWarning::new(
                        line,
                        error.to_string(),
                    ))),
                };
            }
        };

        if record.len() != self.width {
            self.warnings.borrow_mut().push(RowWarning::new(
                line_of(&record),
                format!("expected {} fields, found {}", self.width, record.len()),
            ));
        }

        Ok(Some(self.to_book(&record)))
    }

    fn take_warnings(&self) -> Vec<RowWarning> {
        self.warnings.take()
    }
}

/// A builder for configuring CSV book reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Terminator: CRLF, which accepts `\r\n`, `\r` and `\n`
/// - Header names trimmed, field values kept as is
#[derive(Default)]
pub struct BookCsvReaderBuilder {
    delimiter: u8,
    terminator: Terminator,
}

impl BookCsvReaderBuilder {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            terminator: Terminator::CRLF,
        }
    }

    /// Sets the delimiter character for the CSV parsing.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the line terminator for the CSV parsing.
    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .trim(Trim::Headers)
            .delimiter(self.delimiter)
            .terminator(self.terminator)
            .has_headers(true)
            // Ragged rows are defaulted and reported instead of failing the import
            .flexible(true);
        builder
    }

    /// Creates a reader over any `Read` source and checks its header row.
    ///
    /// # Errors
    ///
    /// - [`EditorError::HeaderMismatch`] when one of `Title`, `Author`,
    ///   `Genre`, `PublishedYear`, `ISBN` is missing (an empty source misses them all)
    /// - [`EditorError::ItemReader`] when the header row cannot be read
    pub fn from_reader<R: Read>(self, rdr: R) -> Result<BookCsvReader<R>> {
        let rdr = self.reader_builder().from_reader(rdr);
        Self::build(rdr)
    }

    /// Creates a reader over the file at `path` and checks its header row.
    ///
    /// # Errors
    ///
    /// Same as [`from_reader`](Self::from_reader), plus [`EditorError::ItemReader`]
    /// when the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<BookCsvReader<File>> {
        let rdr = self
            .reader_builder()
            .from_path(path)
            .map_err(|error| EditorError::ItemReader(error.to_string()))?;
        Self::build(rdr)
    }

    fn build<R: Read>(mut rdr: csv::Reader<R>) -> Result<BookCsvReader<R>> {
        let headers = rdr
            .headers()
            .map_err(|error| EditorError::ItemReader(error.to_string()))?
            .clone();

        let columns = locate_columns(&headers)?;
        debug!("CSV columns located: {:?}", columns);

        Ok(BookCsvReader {
            records: RefCell::new(rdr.into_records()),
            columns,
            width: headers.len(),
            warnings: RefCell::new(Vec::new()),
        })
    }
}

/// Finds the column of every field. The first column wins when a header is
/// repeated.
fn locate_columns(headers: &StringRecord) -> Result<[usize; 5]> {
    let mut columns = [0; 5];
    let mut missing = Vec::new();

    for (slot, field) in columns.iter_mut().zip(BookField::ALL) {
        match headers.iter().position(|header| header == field.as_str()) {
            Some(column) => *slot = column,
            None => missing.push(field.as_str().to_owned()),
        }
    }

    if missing.is_empty() {
        Ok(columns)
    } else {
        Err(EditorError::HeaderMismatch { missing })
    }
}
