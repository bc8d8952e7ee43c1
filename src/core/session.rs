use std::io::Write;

use log::{debug, error, info};
use uuid::Uuid;

use crate::{
    core::{
        book::{Book, BookField, BookId, BookPatch, BookRecord},
        import::{CancelHandle, ImportJob, ImportJobBuilder, ImportOutcome},
        item::{ItemWriter, RowWarning},
        store::RecordStore,
        validation::ValidationRules,
        view::{
            filter_and_sort, page_of, total_pages, Filters, PageSize, SortConfig, UnparsedYears,
            ViewPage, ViewParameters,
        },
    },
    error::{EditorError, Result},
    item::csv::{csv_writer::BookCsvWriterBuilder, edited_file_name},
};

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub job_id: Uuid,
    pub file_name: String,
    /// Number of records now in the store.
    pub loaded: usize,
    pub warnings: Vec<RowWarning>,
}

/// An exported file, ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
    pub count: usize,
}

/// Counters shown next to the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub filtered: usize,
    pub modified: usize,
    pub pages: usize,
    pub page: usize,
}

#[derive(Debug)]
struct PendingImport {
    id: Uuid,
    cancel: CancelHandle,
}

/// The editing session: one store, the view parameters applied to it and the
/// import in flight, if any.
///
/// Every action takes `&mut self` and leaves store and view consistent when it
/// returns; an action that fails leaves both as they were.
///
/// # Examples
///
/// ```
/// use book_csv_editor::core::{book::{BookField, BookPatch}, session::Session, view::Filters};
///
/// let mut session = Session::new();
/// let csv = "Title,Author,Genre,PublishedYear,ISBN
/// Emma,Jane Austen,Fiction,1815,
/// Dune,Frank Herbert,Science Fiction,1965,
/// ";
/// session.import_file("books.csv", csv.as_bytes().to_vec()).unwrap();
///
/// session.set_filters(Filters::default().search("dune"));
/// let id = session.view().records[0].id;
///
/// session
///     .edit_record(id, &BookPatch::new().with(BookField::Title, "Dune Messiah"))
///     .unwrap();
///
/// let export = session.export_csv().unwrap();
/// assert_eq!(export.file_name, "books_edited.csv");
/// assert!(export.contents.contains("Dune Messiah"));
/// assert_eq!(session.stats().modified, 1);
/// ```
#[derive(Debug)]
pub struct Session {
    store: RecordStore,
    params: ViewParameters,
    /// Indices into the store records, filtered and sorted with `params`.
    ordered: Vec<usize>,
    source_name: Option<String>,
    pending: Option<PendingImport>,
    rules: ValidationRules,
    delimiter: u8,
    #[cfg_attr(not(feature = "fake"), allow(dead_code))]
    sample_seed: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        SessionBuilder::new().build()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derives the ordered indices from the store and the parameters.
    fn refresh(&mut self) {
        self.ordered = filter_and_sort(
            self.store.records(),
            &self.params.filters,
            &self.params.sort,
            self.params.unparsed_years,
        );
    }

    /// Replaces the whole store. Filters, sort and page go back to their
    /// defaults; page size and the unparsed years policy are kept.
    fn replace(&mut self, books: Vec<Book>, source_name: Option<String>) {
        self.store.load(books);
        self.source_name = source_name;
        self.params = ViewParameters {
            page_size: self.params.page_size,
            unparsed_years: self.params.unparsed_years,
            ..ViewParameters::default()
        };
        self.refresh();
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.pending {
            Some(_) => Err(EditorError::ImportInProgress),
            None => Ok(()),
        }
    }

    /// Registers an import of `bytes` as pending and returns the job to run.
    ///
    /// # Errors
    ///
    /// [`EditorError::ImportInProgress`] when another import is pending.
    pub fn begin_import(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<ImportJob> {
        self.ensure_idle()?;

        let job = ImportJobBuilder::new()
            .file_name(name)
            .source(bytes)
            .delimiter(self.delimiter)
            .build();

        debug!("Import {} of {} pending", job.id(), job.file_name());
        self.pending = Some(PendingImport {
            id: job.id(),
            cancel: job.cancel_handle(),
        });

        Ok(job)
    }

    /// Applies the outcome of the pending job.
    ///
    /// The pending slot is freed whatever the outcome. On success the store
    /// holds the imported books; otherwise it is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`EditorError::ImportCancelled`] when the job was cancelled, or is
    ///   not the pending one
    /// - the error the job failed with
    pub fn complete_import(&mut self, outcome: ImportOutcome) -> Result<ImportSummary> {
        match self.pending.take() {
            Some(pending) if pending.id == outcome.job_id => {}
            other => {
                self.pending = other;
                info!("Discarding outcome of stale import {}", outcome.job_id);
                return Err(EditorError::ImportCancelled(outcome.job_id));
            }
        }

        let report = outcome.result.inspect_err(|error| {
            error!("Import of {} failed: {}", outcome.file_name, error);
        })?;

        self.replace(report.books, Some(outcome.file_name.clone()));
        info!(
            "Imported {} books from {} in {:?}",
            self.store.len(),
            outcome.file_name,
            outcome.duration
        );

        Ok(ImportSummary {
            job_id: outcome.job_id,
            file_name: outcome.file_name,
            loaded: self.store.len(),
            warnings: report.warnings,
        })
    }

    /// Cancels the pending import. Returns false when there was none.
    pub fn cancel_import(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancel.cancel();
                info!("Import {} cancelled", pending.id);
                true
            }
            None => false,
        }
    }

    pub fn is_importing(&self) -> bool {
        self.pending.is_some()
    }

    /// Imports an uploaded file in one step.
    ///
    /// # Errors
    ///
    /// [`EditorError::ImportInProgress`], [`EditorError::InvalidFileType`] or
    /// [`EditorError::HeaderMismatch`]; the store is unchanged in all cases.
    pub fn import_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<ImportSummary> {
        let job = self.begin_import(name, bytes)?;
        let outcome = job.run();
        self.complete_import(outcome)
    }

    /// Replaces the store with `count` generated books.
    ///
    /// The generated set is named after its size, `sample-books-10k.csv` for
    /// 10 000 books, and exports as `sample-books-10k_edited.csv`.
    ///
    /// # Errors
    ///
    /// [`EditorError::ImportInProgress`] when an import is pending.
    #[cfg(feature = "fake")]
    pub fn generate_sample(&mut self, count: usize) -> Result<usize> {
        self.ensure_idle()?;

        let books = crate::item::fake::generate(count, self.sample_seed);
        self.replace(books, Some(sample_name(count)));
        info!("Generated {} sample books", self.store.len());

        Ok(self.store.len())
    }

    /// Validates the merged book, then saves it.
    ///
    /// # Errors
    ///
    /// - [`EditorError::UnknownRecord`] when `id` is not in the store
    /// - [`EditorError::Validation`] when the merged book breaks a rule
    pub fn edit_record(&mut self, id: BookId, patch: &BookPatch) -> Result<()> {
        let record = self.store.get(id).ok_or(EditorError::UnknownRecord(id))?;
        let merged = patch.apply_to(&record.book);
        self.rules
            .validate(&merged)
            .map_err(EditorError::Validation)?;

        self.store.edit(id, patch)?;
        self.refresh();
        Ok(())
    }

    /// Removes a record. A missing id is a no-op returning `None`.
    pub fn delete_record(&mut self, id: BookId) -> Option<BookRecord> {
        let removed = self.store.delete(id)?;
        self.refresh();
        Some(removed)
    }

    /// Sorts by `field`, or flips the direction when already sorted by it.
    pub fn set_sort(&mut self, field: BookField) {
        self.params.sort = self.params.sort.toggle(field);
        debug!("Sort set to {:?}", self.params.sort);
        self.refresh();
    }

    pub fn set_sort_config(&mut self, sort: SortConfig) {
        self.params.sort = sort;
        self.refresh();
    }

    pub fn set_filters(&mut self, filters: Filters) {
        debug!("Filters set to {:?}", filters);
        self.params.filters = filters;
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.params.filters.clear();
        self.refresh();
    }

    pub fn set_unparsed_years(&mut self, unparsed_years: UnparsedYears) {
        self.params.unparsed_years = unparsed_years;
        self.refresh();
    }

    fn total_pages(&self) -> usize {
        total_pages(self.ordered.len(), self.params.page_size)
    }

    /// Moves to page `page`, clamped to the existing pages. Returns the page
    /// now shown.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.params.page = page.clamp(1, self.total_pages());
        self.params.page
    }

    /// Picks one of the fixed page sizes and keeps the current page in range.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidPageSize`] when `size` is not 25, 50, 100 or 250.
    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        self.params.page_size = PageSize::from_choice(size)?;
        self.params.page = self.params.page.clamp(1, self.total_pages());
        Ok(())
    }

    /// Restores every record as loaded.
    pub fn reset_all_edits(&mut self) {
        self.store.reset();
        self.refresh();
    }

    /// Writes every current record, in store order, regardless of filters.
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// - [`EditorError::EmptyExport`] when the store is empty
    /// - [`EditorError::ItemWriter`] when `wtr` fails
    pub fn write_csv<W: Write>(&self, wtr: W) -> Result<usize> {
        if self.store.is_empty() {
            return Err(EditorError::EmptyExport);
        }

        let writer = BookCsvWriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(wtr);
        ItemWriter::<BookRecord>::open(&writer)?;
        writer.write(self.store.records())?;
        ItemWriter::<BookRecord>::flush(&writer)?;

        Ok(self.store.len())
    }

    /// Serializes the store and names the file after the imported one.
    ///
    /// # Errors
    ///
    /// [`EditorError::EmptyExport`] when the store is empty.
    pub fn export_csv(&self) -> Result<CsvExport> {
        let mut buffer = Vec::new();
        let count = self.write_csv(&mut buffer)?;
        let contents =
            String::from_utf8(buffer).map_err(|error| EditorError::ItemWriter(error.to_string()))?;
        let file_name = self.export_file_name();

        info!("Exported {} books as {}", count, file_name);

        Ok(CsvExport {
            file_name,
            contents,
            count,
        })
    }

    /// The current page.
    pub fn view(&self) -> ViewPage<'_> {
        page_of(
            self.store.records(),
            &self.ordered,
            self.params.page,
            self.params.page_size,
        )
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total: self.store.len(),
            filtered: self.ordered.len(),
            modified: self.store.modified_count(),
            pages: self.total_pages(),
            page: self.params.page,
        }
    }

    pub fn genres(&self) -> Vec<&str> {
        self.store.genres()
    }

    pub fn is_modified(&self, id: BookId) -> bool {
        self.store.is_modified(id)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn params(&self) -> &ViewParameters {
        &self.params
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Name of the imported file the records come from, if any.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn export_file_name(&self) -> String {
        edited_file_name(self.source_name())
    }
}

/// Builder for a [`Session`].
///
/// # Default Configuration
///
/// - Delimiter: comma (,), for import and export
/// - Page size: 50
/// - Unparsed years: excluded by year bounds
/// - Validation: [`ValidationRules::default`]
/// - Sample seed: none, each generation differs
#[derive(Default)]
pub struct SessionBuilder {
    rules: Option<ValidationRules>,
    delimiter: Option<u8>,
    page_size: PageSize,
    unparsed_years: UnparsedYears,
    sample_seed: Option<u64>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(mut self, rules: ValidationRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn unparsed_years(mut self, unparsed_years: UnparsedYears) -> Self {
        self.unparsed_years = unparsed_years;
        self
    }

    /// Makes generated samples reproducible.
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    pub fn build(self) -> Session {
        Session {
            store: RecordStore::new(),
            params: ViewParameters {
                page_size: self.page_size,
                unparsed_years: self.unparsed_years,
                ..ViewParameters::default()
            },
            ordered: Vec::new(),
            source_name: None,
            pending: None,
            rules: self.rules.unwrap_or_default(),
            delimiter: self.delimiter.unwrap_or(b','),
            sample_seed: self.sample_seed,
        }
    }
}

/// Source name given to a generated set, with round thousands as `k`.
#[cfg(feature = "fake")]
fn sample_name(count: usize) -> String {
    if count >= 1_000 && count % 1_000 == 0 {
        format!("sample-books-{}k.csv", count / 1_000)
    } else {
        format!("sample-books-{}.csv", count)
    }
}
