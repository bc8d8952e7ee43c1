use std::{fmt, str::FromStr};

use log::debug;
use serde::Serialize;

/// Identity of a record inside a [`RecordStore`](crate::core::store::RecordStore).
///
/// Ids come from a monotonic counter owned by the store and are never reused,
/// not even after a wholesale replacement of the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(pub u64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the five fixed fields of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BookField {
    Title,
    Author,
    Genre,
    PublishedYear,
    Isbn,
}

impl BookField {
    /// All fields, in CSV header order.
    pub const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Genre,
        BookField::PublishedYear,
        BookField::Isbn,
    ];

    /// The CSV header name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Genre => "Genre",
            BookField::PublishedYear => "PublishedYear",
            BookField::Isbn => "ISBN",
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names none of the five fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for BookField {
    type Err = UnknownField;

    /// Header names are matched exactly, the way they appear in the CSV header row.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

/// The five textual fields of a book, as they travel through CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Book {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "PublishedYear")]
    pub published_year: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        published_year: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            published_year: published_year.into(),
            isbn: isbn.into(),
        }
    }

    pub fn get(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Genre => &self.genre,
            BookField::PublishedYear => &self.published_year,
            BookField::Isbn => &self.isbn,
        }
    }

    pub fn set(&mut self, field: BookField, value: String) {
        match field {
            BookField::Title => self.title = value,
            BookField::Author => self.author = value,
            BookField::Genre => self.genre = value,
            BookField::PublishedYear => self.published_year = value,
            BookField::Isbn => self.isbn = value,
        }
    }

    /// `PublishedYear` as an integer, `None` when empty or not a number.
    pub fn year(&self) -> Option<i32> {
        parse_year(&self.published_year)
    }

}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "title:{}, author:{}, genre:{}, year:{}, isbn:{}",
            self.title, self.author, self.genre, self.published_year, self.isbn
        )
    }
}

/// Reads the year at the start of `text`: leading whitespace, an optional
/// sign, then as many digits as follow. Trailing text is ignored, so `"1990s"`
/// and `"1850?"` are years; `None` when no digit comes first or the value
/// does not fit an `i32`.
pub fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }

    let sign_len = text.len() - unsigned.len();
    text[..sign_len + digits].parse().ok()
}

/// A book together with its identity in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: BookId,
    pub book: Book,
}

impl BookRecord {
    pub fn new(id: BookId, book: Book) -> Self {
        Self { id, book }
    }
}

/// A partial update of a book: only the fields set to `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub published_year: Option<String>,
    pub isbn: Option<String>,
}

impl BookPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field of the patch. Chainable.
    pub fn with(mut self, field: BookField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            BookField::Title => self.title = value,
            BookField::Author => self.author = value,
            BookField::Genre => self.genre = value,
            BookField::PublishedYear => self.published_year = value,
            BookField::Isbn => self.isbn = value,
        }
        self
    }

    /// Builds a patch from loosely typed key/value pairs, such as the inputs of
    /// a form. Keys naming none of the five fields are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(BookPatch::new(), |patch, (key, value)| {
                match key.as_ref().parse::<BookField>() {
                    Ok(field) => patch.with(field, value),
                    Err(error) => {
                        debug!("Ignoring patch entry: {}", error);
                        patch
                    }
                }
            })
    }

    /// A patch replacing every field with the values of `book`.
    pub fn replace_all(book: &Book) -> Self {
        BookField::ALL
            .into_iter()
            .fold(BookPatch::new(), |patch, field| {
                patch.with(field, book.get(field))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// The fields carried by the patch, in header order.
    pub fn fields(&self) -> impl Iterator<Item = (BookField, &str)> {
        [
            (BookField::Title, &self.title),
            (BookField::Author, &self.author),
            (BookField::Genre, &self.genre),
            (BookField::PublishedYear, &self.published_year),
            (BookField::Isbn, &self.isbn),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
    }

    /// Returns `book` with the patch merged in.
    pub fn apply_to(&self, book: &Book) -> Book {
        let mut merged = book.clone();
        for (field, value) in self.fields() {
            merged.set(field, value.to_owned());
        }
        merged
    }
}
