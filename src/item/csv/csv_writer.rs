use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{self, Write},
    path::Path,
    result,
};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use crate::{
    core::{
        book::{Book, BookField, BookRecord},
        item::{ItemWriter, ItemWriterResult},
    },
    error::EditorError,
};

/// A CSV writer for books, with the fixed `Title,Author,Genre,PublishedYear,ISBN`
/// header.
///
/// Fields are quoted only when they contain the delimiter, a quote or a line
/// break; quotes inside a quoted field are doubled. Record ids are never
/// written.
///
/// The header row is written by [`ItemWriter::open`], or lazily before the
/// first batch when `open` was not called.
pub struct BookCsvWriter<T: Write> {
    wrapper: RefCell<Writer<T>>,
    has_headers: bool,
    header_written: Cell<bool>,
}

impl<T: Write> BookCsvWriter<T> {
    fn write_header(&self) -> ItemWriterResult {
        if !self.has_headers || self.header_written.get() {
            return Ok(());
        }
        self.wrapper
            .borrow_mut()
            .write_record(BookField::ALL.map(|field| field.as_str()))
            .map_err(|error| EditorError::ItemWriter(error.to_string()))?;
        self.header_written.set(true);
        Ok(())
    }

    fn write_books<'a, I>(&self, books: I) -> ItemWriterResult
    where
        I: IntoIterator<Item = &'a Book>,
    {
        self.write_header()?;
        let mut wtr = self.wrapper.borrow_mut();
        for book in books {
            wtr.serialize(book)
                .map_err(|error| EditorError::ItemWriter(error.to_string()))?;
        }
        Ok(())
    }

    fn flush_inner(&self) -> ItemWriterResult {
        self.wrapper
            .borrow_mut()
            .flush()
            .map_err(|error| EditorError::ItemWriter(error.to_string()))
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> result::Result<T, EditorError> {
        self.wrapper
            .into_inner()
            .into_inner()
            .map_err(|error| EditorError::ItemWriter(error.to_string()))
    }
}

impl<T: Write> ItemWriter<Book> for BookCsvWriter<T> {
    fn write(&self, items: &[Book]) -> ItemWriterResult {
        self.write_books(items)
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// Note that this also flushes the underlying writer.
    fn flush(&self) -> ItemWriterResult {
        self.flush_inner()
    }

    fn open(&self) -> ItemWriterResult {
        self.write_header()
    }
}

impl<T: Write> ItemWriter<BookRecord> for BookCsvWriter<T> {
    fn write(&self, items: &[BookRecord]) -> ItemWriterResult {
        self.write_books(items.iter().map(|record| &record.book))
    }

    fn flush(&self) -> ItemWriterResult {
        self.flush_inner()
    }

    fn open(&self) -> ItemWriterResult {
        self.write_header()
    }
}

#[derive(Default)]
pub struct BookCsvWriterBuilder {
    delimiter: u8,
    has_headers: bool,
}

impl BookCsvWriterBuilder {
    /// A comma-delimited writer emitting the header row.
    pub fn new() -> BookCsvWriterBuilder {
        BookCsvWriterBuilder {
            delimiter: b',',
            has_headers: true,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> BookCsvWriterBuilder {
        self.delimiter = delimiter;
        self
    }

    pub fn has_headers(mut self, yes: bool) -> BookCsvWriterBuilder {
        self.has_headers = yes;
        self
    }

    fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .flexible(false)
            // The header row comes from the fixed field set, not from serde
            .has_headers(false);
        builder
    }

    /// Creates a writer to the file at `path`, truncating it.
    ///
    /// # Errors
    ///
    /// [`EditorError::ItemWriter`] when the file cannot be created.
    pub fn from_path<R: AsRef<Path>>(
        self,
        path: R,
    ) -> result::Result<BookCsvWriter<File>, EditorError> {
        let wtr = self
            .writer_builder()
            .from_path(path)
            .map_err(|error| EditorError::ItemWriter(error.to_string()))?;

        Ok(BookCsvWriter {
            wrapper: RefCell::new(wtr),
            has_headers: self.has_headers,
            header_written: Cell::new(false),
        })
    }

    /// Creates a writer to any `Write` destination.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// use book_csv_editor::core::{book::Book, item::ItemWriter};
    /// use book_csv_editor::item::csv::csv_writer::BookCsvWriterBuilder;
    ///
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let wtr = BookCsvWriterBuilder::new().from_writer(vec![]);
    ///
    /// wtr.write(&[Book::new("Love, Actually", "Ann", "Romance", "2003", "")])?;
    ///
    /// let data = String::from_utf8(wtr.into_inner()?)?;
    /// assert_eq!(data, "\
    /// Title,Author,Genre,PublishedYear,ISBN
    /// \"Love, Actually\",Ann,Romance,2003,
    /// ");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_writer<W: io::Write>(self, wtr: W) -> BookCsvWriter<W> {
        let wtr = self.writer_builder().from_writer(wtr);

        BookCsvWriter {
            wrapper: RefCell::new(wtr),
            has_headers: self.has_headers,
            header_written: Cell::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use tempfile::NamedTempFile;

    use crate::core::{
        book::{Book, BookId, BookRecord},
        item::ItemWriter,
    };

    use super::BookCsvWriterBuilder;

    #[test]
    fn books_should_be_written_with_header() -> Result<(), Box<dyn Error>> {
        let wtr = BookCsvWriterBuilder::new().from_writer(vec![]);

        ItemWriter::<Book>::open(&wtr)?;
        wtr.write(&[
            Book::new("Emma", "Jane Austen", "Fiction", "1815", ""),
            Book::new("Say \"hi\"", "A\nB", "Poetry", "", "0-306-40615-2"),
        ])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(
            data,
            "Title,Author,Genre,PublishedYear,ISBN
Emma,Jane Austen,Fiction,1815,
\"Say \"\"hi\"\"\",\"A\nB\",Poetry,,0-306-40615-2
"
        );

        Ok(())
    }

    #[test]
    fn header_should_be_written_once() -> Result<(), Box<dyn Error>> {
        let wtr = BookCsvWriterBuilder::new().from_writer(vec![]);

        wtr.write(&[Book::new("A", "", "", "", "")])?;
        wtr.write(&[Book::new("B", "", "", "", "")])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(data, "Title,Author,Genre,PublishedYear,ISBN\nA,,,,\nB,,,,\n");

        Ok(())
    }

    #[test]
    fn records_should_be_written_without_id() -> Result<(), Box<dyn Error>> {
        let wtr = BookCsvWriterBuilder::new()
            .has_headers(false)
            .delimiter(b';')
            .from_writer(vec![]);

        wtr.write(&[BookRecord::new(
            BookId(7),
            Book::new("Emma", "Jane Austen", "Fiction", "1815", ""),
        )])?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        assert_eq!(data, "Emma;Jane Austen;Fiction;1815;\n");

        Ok(())
    }

    #[test]
    fn books_should_be_written_to_path() -> Result<(), Box<dyn Error>> {
        let file = NamedTempFile::new()?;
        let wtr = BookCsvWriterBuilder::new().from_path(file.path())?;

        wtr.write(&[Book::new("Emma", "Jane Austen", "Fiction", "1815", "")])?;
        ItemWriter::<Book>::flush(&wtr)?;

        let data = std::fs::read_to_string(file.path())?;
        assert!(data.starts_with("Title,Author,Genre,PublishedYear,ISBN\n"));
        assert!(data.contains("Emma,Jane Austen"));

        Ok(())
    }
}
