//! The filter → sort → paginate pipeline.
//!
//! Every function of this module is pure: the same records and parameters
//! always give the same page. The pipeline is split in stages so that callers
//! holding on to the ordered indices (see [`Session`](crate::core::session::Session))
//! can page through them without filtering and sorting again.
//!
//! # Examples
//!
//! ```
//! use book_csv_editor::core::book::{Book, BookField, BookId, BookRecord};
//! use book_csv_editor::core::view::{view, PageSize, SortConfig, ViewParameters};
//!
//! let records: Vec<BookRecord> = [("A", "2000"), ("B", "1990"), ("C", "1990")]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(i, (title, year))| {
//!         BookRecord::new(BookId(i as u64), Book::new(title, "", "", year, ""))
//!     })
//!     .collect();
//!
//! let mut params = ViewParameters::default();
//! params.sort = SortConfig::default().toggle(BookField::PublishedYear);
//! params.page_size = PageSize::Custom(2);
//!
//! let page = view(&records, &params);
//! let titles: Vec<&str> = page.records.iter().map(|r| r.book.title.as_str()).collect();
//! assert_eq!(titles, vec!["B", "C"]);
//! assert_eq!(page.total_filtered, 3);
//! assert_eq!(page.total_pages, 2);
//! ```

use std::{cmp::Reverse, fmt, ops::Range};

use crate::{
    core::book::{Book, BookField, BookRecord},
    error::{EditorError, Result},
};

/// What a year bound does with a `PublishedYear` that is not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnparsedYears {
    /// The record fails any active year bound.
    #[default]
    Exclude,
    /// The record passes every year bound.
    Include,
}

/// Filter criteria, all combined with AND. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Case-insensitive substring of title, author, genre or ISBN.
    pub search: String,
    /// Exact genre.
    pub genre: String,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl Filters {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    pub fn year_from(mut self, year: i32) -> Self {
        self.year_from = Some(year);
        self
    }

    pub fn year_to(mut self, year: i32) -> Self {
        self.year_to = Some(year);
        self
    }

    /// True when at least one criterion constrains the records.
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || !self.genre.is_empty()
            || self.year_from.is_some()
            || self.year_to.is_some()
    }

    pub fn clear(&mut self) {
        *self = Filters::default();
    }

    /// Compiles the criteria once so they can be checked against many books.
    fn matcher(&self, unparsed: UnparsedYears) -> Matcher<'_> {
        Matcher {
            needle: self.search.to_lowercase(),
            filters: self,
            unparsed,
        }
    }
}

struct Matcher<'a> {
    needle: String,
    filters: &'a Filters,
    unparsed: UnparsedYears,
}

impl Matcher<'_> {
    fn matches(&self, book: &Book) -> bool {
        self.matches_search(book) && self.matches_genre(book) && self.matches_years(book)
    }

    fn matches_search(&self, book: &Book) -> bool {
        self.needle.is_empty()
            || [&book.title, &book.author, &book.genre, &book.isbn]
                .into_iter()
                .any(|value| value.to_lowercase().contains(&self.needle))
    }

    fn matches_genre(&self, book: &Book) -> bool {
        self.filters.genre.is_empty() || book.genre == self.filters.genre
    }

    fn matches_years(&self, book: &Book) -> bool {
        let (from, to) = (self.filters.year_from, self.filters.year_to);
        if from.is_none() && to.is_none() {
            return true;
        }

        match book.year() {
            Some(year) => from.is_none_or(|from| year >= from) && to.is_none_or(|to| year <= to),
            None => self.unparsed == UnparsedYears::Include,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// The sort column, if any, and its direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortConfig {
    pub key: Option<BookField>,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn by(key: BookField, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// The configuration after a click on the `field` column: the current
    /// column flips its direction, another column starts ascending.
    pub fn toggle(self, field: BookField) -> Self {
        match self.key {
            Some(key) if key == field => SortConfig::by(field, self.direction.flip()),
            _ => SortConfig::by(field, SortDirection::Asc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Year(i32),
    Text(String),
}

impl SortKey {
    fn of(book: &Book, field: BookField) -> Self {
        match field {
            BookField::PublishedYear => SortKey::Year(book.year().unwrap_or(0)),
            _ => SortKey::Text(book.get(field).to_lowercase()),
        }
    }
}

/// Number of records per page.
///
/// The presentation offers the four fixed sizes; [`PageSize::Custom`] exists
/// for callers driving the pipeline directly (tests, exports by chunk).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSize {
    TwentyFive,
    #[default]
    Fifty,
    OneHundred,
    TwoHundredFifty,
    Custom(usize),
}

impl PageSize {
    /// The sizes a user can pick from.
    pub const CHOICES: [PageSize; 4] = [
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::OneHundred,
        PageSize::TwoHundredFifty,
    ];

    /// Never zero: a custom size of zero counts as one.
    pub fn get(self) -> usize {
        match self {
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::OneHundred => 100,
            PageSize::TwoHundredFifty => 250,
            PageSize::Custom(size) => size.max(1),
        }
    }

    /// Maps a user choice to one of the fixed sizes.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidPageSize`] when `size` is not one of 25, 50, 100, 250.
    pub fn from_choice(size: usize) -> Result<Self> {
        PageSize::CHOICES
            .into_iter()
            .find(|choice| choice.get() == size)
            .ok_or(EditorError::InvalidPageSize(size))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Everything the pipeline needs besides the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParameters {
    pub filters: Filters,
    pub sort: SortConfig,
    /// 1-based.
    pub page: usize,
    pub page_size: PageSize,
    pub unparsed_years: UnparsedYears,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            sort: SortConfig::default(),
            page: 1,
            page_size: PageSize::default(),
            unparsed_years: UnparsedYears::default(),
        }
    }
}

/// One page of the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPage<'a> {
    pub records: Vec<&'a BookRecord>,
    /// Records left after filtering, across all pages.
    pub total_filtered: usize,
    /// At least 1, even when nothing survives the filters.
    pub total_pages: usize,
    pub page: usize,
    /// Position of the first record of the page in the filtered sequence.
    pub start_index: usize,
}

/// Filters then stably sorts `records`, returning indices into `records`.
pub fn filter_and_sort(
    records: &[BookRecord],
    filters: &Filters,
    sort: &SortConfig,
    unparsed: UnparsedYears,
) -> Vec<usize> {
    let matcher = filters.matcher(unparsed);
    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| matcher.matches(&record.book))
        .map(|(index, _)| index)
        .collect();

    // sort_by_cached_key is stable, so equal keys keep their filtered order
    // in both directions.
    if let Some(key) = sort.key {
        match sort.direction {
            SortDirection::Asc => {
                indices.sort_by_cached_key(|&index| SortKey::of(&records[index].book, key))
            }
            SortDirection::Desc => indices
                .sort_by_cached_key(|&index| Reverse(SortKey::of(&records[index].book, key))),
        }
    }

    indices
}

/// `ceil(len / page_size)`, with an empty sequence counting as one page.
pub fn total_pages(len: usize, page_size: PageSize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// Range of positions covered by `page` (1-based, 0 read as 1) within a
/// sequence of `len` items. Pages past the end give an empty range.
pub fn paginate(len: usize, page: usize, page_size: PageSize) -> Range<usize> {
    let size = page_size.get();
    let start = page.saturating_sub(1).saturating_mul(size).min(len);
    let end = start.saturating_add(size).min(len);
    start..end
}

/// Page numbers a pager shows around `current`: up to `width` consecutive
/// pages, centered on `current` and shifted when close to either end.
pub fn page_window(current: usize, total: usize, width: usize) -> Range<usize> {
    if total == 0 || width == 0 {
        return 1..1;
    }
    let current = current.clamp(1, total);
    let mut start = current.saturating_sub(width / 2).max(1);
    let end = (start + width - 1).min(total);
    if end - start < width - 1 {
        start = (end + 1).saturating_sub(width).max(1);
    }
    start..end + 1
}

/// Runs the whole pipeline over `records`.
pub fn view<'a>(records: &'a [BookRecord], params: &ViewParameters) -> ViewPage<'a> {
    let ordered = filter_and_sort(
        records,
        &params.filters,
        &params.sort,
        params.unparsed_years,
    );
    page_of(records, &ordered, params.page, params.page_size)
}

/// Cuts page `page` out of already ordered indices.
pub fn page_of<'a>(
    records: &'a [BookRecord],
    ordered: &[usize],
    page: usize,
    page_size: PageSize,
) -> ViewPage<'a> {
    let range = paginate(ordered.len(), page, page_size);
    ViewPage {
        start_index: range.start,
        records: ordered[range].iter().map(|&index| &records[index]).collect(),
        total_filtered: ordered.len(),
        total_pages: total_pages(ordered.len(), page_size),
        page: page.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        filter_and_sort, page_window, paginate, total_pages, view, Filters, PageSize, SortConfig,
        SortDirection, UnparsedYears, ViewParameters,
    };
    use crate::{
        core::book::{Book, BookField, BookId, BookRecord},
        error::EditorError,
    };

    fn records() -> Vec<BookRecord> {
        [("A", "2000"), ("B", "1990"), ("C", "1990")]
            .into_iter()
            .enumerate()
            .map(|(i, (title, year))| {
                BookRecord::new(BookId(i as u64), Book::new(title, "", "", year, ""))
            })
            .collect()
    }

    fn titles(page: &super::ViewPage<'_>) -> Vec<String> {
        page.records.iter().map(|r| r.book.title.clone()).collect()
    }

    #[test]
    fn sorted_pages_should_follow_year_then_input_order() {
        let records = records();
        let mut params = ViewParameters {
            sort: SortConfig::by(BookField::PublishedYear, SortDirection::Asc),
            page_size: PageSize::Custom(2),
            ..ViewParameters::default()
        };

        assert_eq!(titles(&view(&records, &params)), vec!["B", "C"]);
        params.page = 2;
        assert_eq!(titles(&view(&records, &params)), vec!["A"]);
        params.page = 3;
        let page = view(&records, &params);
        assert!(page.records.is_empty());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.start_index, 3);
    }

    #[test]
    fn descending_sort_should_stay_stable() {
        let records = records();
        let ordered = filter_and_sort(
            &records,
            &Filters::default(),
            &SortConfig::by(BookField::PublishedYear, SortDirection::Desc),
            UnparsedYears::Exclude,
        );
        assert_eq!(ordered, vec![0, 1, 2]);
    }

    #[test]
    fn year_from_should_keep_recent_books() {
        let records = records();
        let params = ViewParameters {
            filters: Filters::default().year_from(1995),
            ..ViewParameters::default()
        };
        assert_eq!(titles(&view(&records, &params)), vec!["A"]);
    }

    #[test]
    fn unparsed_years_follow_policy() {
        let mut records = records();
        records[1].book.published_year = "unknown".to_string();
        let filters = Filters::default().year_to(2010);
        let sort = SortConfig::default();

        let excluded = filter_and_sort(&records, &filters, &sort, UnparsedYears::Exclude);
        let included = filter_and_sort(&records, &filters, &sort, UnparsedYears::Include);

        assert_eq!(excluded, vec![0, 2]);
        assert_eq!(included, vec![0, 1, 2]);
    }

    #[test]
    fn years_with_trailing_text_should_filter_and_sort_by_their_digits() {
        let mut records = records();
        records[0].book.published_year = "1850?".to_string();
        records[1].book.published_year = "1990s".to_string();
        records[2].book.published_year = "1960.5".to_string();

        let bounded = filter_and_sort(
            &records,
            &Filters::default().year_from(1900).year_to(1999),
            &SortConfig::by(BookField::PublishedYear, SortDirection::Asc),
            UnparsedYears::Exclude,
        );

        assert_eq!(bounded, vec![2, 1]);
    }

    #[test]
    fn unparsed_years_sort_as_zero() {
        let mut records = records();
        records[2].book.published_year = String::new();
        let ordered = filter_and_sort(
            &records,
            &Filters::default(),
            &SortConfig::by(BookField::PublishedYear, SortDirection::Asc),
            UnparsedYears::Exclude,
        );
        assert_eq!(ordered, vec![2, 1, 0]);
    }

    #[test]
    fn search_should_ignore_case_across_fields() {
        let records = vec![
            BookRecord::new(BookId(0), Book::new("Dune", "Frank Herbert", "SF", "", "")),
            BookRecord::new(BookId(1), Book::new("Emma", "Jane Austen", "Romance", "", "")),
            BookRecord::new(BookId(2), Book::new("Ulysses", "James Joyce", "Modernism", "", "978-1")),
        ];
        let sort = SortConfig::default();
        let unparsed = UnparsedYears::Exclude;

        let by_author = filter_and_sort(&records, &Filters::default().search("HERB"), &sort, unparsed);
        let by_genre = filter_and_sort(&records, &Filters::default().search("roman"), &sort, unparsed);
        let by_isbn = filter_and_sort(&records, &Filters::default().search("978"), &sort, unparsed);

        assert_eq!(by_author, vec![0]);
        assert_eq!(by_genre, vec![1]);
        assert_eq!(by_isbn, vec![2]);
    }

    #[test]
    fn genre_should_match_exactly() {
        let records = vec![
            BookRecord::new(BookId(0), Book::new("A", "", "Fiction", "", "")),
            BookRecord::new(BookId(1), Book::new("B", "", "Science Fiction", "", "")),
            BookRecord::new(BookId(2), Book::new("C", "", "fiction", "", "")),
        ];
        let ordered = filter_and_sort(
            &records,
            &Filters::default().genre("Fiction"),
            &SortConfig::default(),
            UnparsedYears::Exclude,
        );
        assert_eq!(ordered, vec![0]);
    }

    #[test]
    fn text_sort_should_ignore_case() {
        let records = vec![
            BookRecord::new(BookId(0), Book::new("banana", "", "", "", "")),
            BookRecord::new(BookId(1), Book::new("Apple", "", "", "", "")),
            BookRecord::new(BookId(2), Book::new("cherry", "", "", "", "")),
        ];
        let ordered = filter_and_sort(
            &records,
            &Filters::default(),
            &SortConfig::by(BookField::Title, SortDirection::Asc),
            UnparsedYears::Exclude,
        );
        assert_eq!(ordered, vec![1, 0, 2]);
    }

    #[test]
    fn toggle_should_flip_same_field_only() {
        let sort = SortConfig::default().toggle(BookField::Title);
        assert_eq!(sort, SortConfig::by(BookField::Title, SortDirection::Asc));

        let sort = sort.toggle(BookField::Title);
        assert_eq!(sort, SortConfig::by(BookField::Title, SortDirection::Desc));

        let sort = sort.toggle(BookField::Author);
        assert_eq!(sort, SortConfig::by(BookField::Author, SortDirection::Asc));
    }

    #[test]
    fn empty_sequence_is_one_empty_page() {
        assert_eq!(total_pages(0, PageSize::Fifty), 1);
        assert_eq!(paginate(0, 1, PageSize::Fifty), 0..0);
        assert_eq!(paginate(10, 0, PageSize::Custom(4)), 0..4);
        assert_eq!(total_pages(101, PageSize::Fifty), 3);
    }

    #[test]
    fn page_size_choices_are_fixed() {
        assert_eq!(PageSize::from_choice(100).unwrap(), PageSize::OneHundred);
        assert!(matches!(
            PageSize::from_choice(30),
            Err(EditorError::InvalidPageSize(30))
        ));
        assert_eq!(PageSize::Custom(0).get(), 1);
    }

    #[test]
    fn page_window_should_shift_at_edges() {
        assert_eq!(page_window(1, 10, 5), 1..6);
        assert_eq!(page_window(5, 10, 5), 3..8);
        assert_eq!(page_window(10, 10, 5), 6..11);
        assert_eq!(page_window(2, 3, 5), 1..4);
    }

    #[test]
    fn active_filters_are_detected() {
        let mut filters = Filters::default().genre("Poetry");
        assert!(filters.is_active());
        filters.clear();
        assert!(!filters.is_active());
    }
}
