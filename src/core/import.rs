use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    core::{
        book::Book,
        item::{ItemReader, RowWarning},
    },
    error::{EditorError, Result},
    item::csv::csv_reader::BookCsvReaderBuilder,
};

/// Books read from a source, with the warnings met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub books: Vec<Book>,
    /// Sorted by line.
    pub warnings: Vec<RowWarning>,
}

/// Shared flag used to stop an import between two rows.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reads every item of `reader`.
///
/// Rows reported as [`EditorError::ParseRow`] are logged and skipped; any
/// other error stops the read. Returns `Ok(None)` when `cancel` fired before
/// the source was exhausted.
pub fn drain<R>(reader: &R, cancel: Option<&CancelHandle>) -> Result<Option<ImportReport>>
where
    R: ItemReader<Book> + ?Sized,
{
    let mut report = ImportReport::default();

    loop {
        if cancel.is_some_and(CancelHandle::is_cancelled) {
            debug!("Read cancelled after {} items", report.books.len());
            return Ok(None);
        }

        match reader.read() {
            Ok(Some(book)) => report.books.push(book),
            Ok(None) => break,
            Err(EditorError::ParseRow(warning)) => {
                warn!("Row skipped, {}", warning);
                report.warnings.push(warning);
            }
            Err(error) => return Err(error),
        }
    }

    let kept = reader.take_warnings();
    for warning in &kept {
        warn!("Row defaulted, {}", warning);
    }
    report.warnings.extend(kept);
    report.warnings.sort_by_key(|warning| warning.line);

    Ok(Some(report))
}

/// Checks that uploaded bytes look like a CSV file and decodes them.
///
/// The name, when given, must end with `.csv`; the content must be UTF-8
/// text without NUL bytes. A leading byte order mark is dropped.
pub fn decode_upload<'a>(name: Option<&str>, bytes: &'a [u8]) -> Result<&'a str> {
    if let Some(name) = name {
        let is_csv = Path::new(name)
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(EditorError::InvalidFileType(format!(
                "{} is not a .csv file",
                name
            )));
        }
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|error| EditorError::InvalidFileType(format!("not UTF-8 text: {}", error)))?;

    if text.contains('\0') {
        return Err(EditorError::InvalidFileType(
            "binary content found".to_string(),
        ));
    }

    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// What an import job hands back to the session, in a single piece.
#[derive(Debug)]
pub struct ImportOutcome {
    pub job_id: Uuid,
    pub file_name: String,
    pub duration: Duration,
    pub result: Result<ImportReport>,
}

/// One pending import of an uploaded file.
///
/// A job owns its input, so it can be run wherever the caller schedules it;
/// the session only sees its [`ImportOutcome`].
///
/// # Examples
///
/// ```
/// use book_csv_editor::core::import::ImportJobBuilder;
///
/// let job = ImportJobBuilder::new()
///     .file_name("books.csv")
///     .source(b"Title,Author,Genre,PublishedYear,ISBN\nEmma,Jane Austen,Fiction,1815,\n".to_vec())
///     .build();
///
/// let outcome = job.run();
/// let report = outcome.result.unwrap();
/// assert_eq!(report.books.len(), 1);
/// ```
#[derive(Debug)]
pub struct ImportJob {
    id: Uuid,
    file_name: String,
    source: Vec<u8>,
    delimiter: u8,
    cancel: CancelHandle,
}

impl ImportJob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// A handle that stops the job at the next row boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Checks, decodes and parses the source.
    pub fn run(self) -> ImportOutcome {
        let start = Instant::now();

        info!("Start of import: {}, id: {}", self.file_name, self.id);

        let result = self.parse();

        match &result {
            Ok(report) => info!(
                "End of import: {}, id: {}, {} books, {} warnings",
                self.file_name,
                self.id,
                report.books.len(),
                report.warnings.len()
            ),
            Err(error) => warn!("Import {} failed: {}", self.id, error),
        }

        ImportOutcome {
            job_id: self.id,
            file_name: self.file_name,
            duration: start.elapsed(),
            result,
        }
    }

    fn parse(&self) -> Result<ImportReport> {
        let text = decode_upload(Some(&self.file_name), &self.source)?;
        let reader = BookCsvReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes())?;

        drain(&reader, Some(&self.cancel))?.ok_or(EditorError::ImportCancelled(self.id))
    }
}

/// Builder for an [`ImportJob`].
#[derive(Default)]
pub struct ImportJobBuilder {
    file_name: Option<String>,
    source: Vec<u8>,
    delimiter: Option<u8>,
}

impl ImportJobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn source(mut self, source: Vec<u8>) -> Self {
        self.source = source;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Without a file name, the job is named `upload.csv`.
    pub fn build(self) -> ImportJob {
        ImportJob {
            id: Uuid::new_v4(),
            file_name: self.file_name.unwrap_or_else(|| "upload.csv".to_string()),
            source: self.source,
            delimiter: self.delimiter.unwrap_or(b','),
            cancel: CancelHandle::default(),
        }
    }
}
