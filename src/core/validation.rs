use std::fmt;

use time::OffsetDateTime;

use crate::core::book::{Book, BookField};

/// A rejected field of an edit, with a message meant for the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: BookField,
    pub message: String,
}

/// Every field error of a single edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// The message for `field`, if that field was rejected.
    pub fn get(&self, field: BookField) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    fn push(&mut self, field: BookField, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// Rules an edited book must satisfy before it is saved.
///
/// - `Title`, `Author` and `Genre` are required
/// - a non-empty `PublishedYear` must be an integer between `min_year` and `max_year`
/// - a non-empty `ISBN` may only hold digits, hyphens and `X`; its length and
///   check digit are not verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for ValidationRules {
    /// Years from 0 up to ten years past the current one.
    fn default() -> Self {
        Self {
            min_year: 0,
            max_year: OffsetDateTime::now_utc().year() + 10,
        }
    }
}

impl ValidationRules {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self { min_year, max_year }
    }

    pub fn validate(&self, book: &Book) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for field in [BookField::Title, BookField::Author, BookField::Genre] {
            if book.get(field).trim().is_empty() {
                errors.push(field, format!("{} is required", field));
            }
        }

        if !book.published_year.trim().is_empty() {
            match book.published_year.trim().parse::<i32>().ok() {
                None => errors.push(BookField::PublishedYear, "Year must be a valid number"),
                Some(year) if year < self.min_year || year > self.max_year => errors.push(
                    BookField::PublishedYear,
                    format!(
                        "Year must be between {} and {}",
                        self.min_year, self.max_year
                    ),
                ),
                Some(_) => {}
            }
        }

        if !book.isbn.trim().is_empty() {
            if let Err(message) = check_isbn(book.isbn.trim()) {
                errors.push(BookField::Isbn, message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_isbn(isbn: &str) -> Result<(), &'static str> {
    if isbn.chars().all(|c| c.is_ascii_digit() || c == '-' || c == 'X') {
        Ok(())
    } else {
        Err("ISBN may only contain digits, hyphens and X")
    }
}
