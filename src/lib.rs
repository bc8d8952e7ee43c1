#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Book CSV Editor

 An in-memory, spreadsheet-like editing core for book records. Books are
 imported from CSV (or generated), edited one record at a time, browsed through
 a filter → sort → paginate view, and exported back to CSV. Every edit can be
 undone at once by resetting to the records as they were loaded.

 The crate holds the data side only: a front end calls the actions of
 [`Session`](core::session::Session) and renders what [`Session::view`](core::session::Session::view)
 returns.

 ## Core Concepts

- **Book:** the five CSV fields `Title`, `Author`, `Genre`, `PublishedYear` and `ISBN`, all kept as text.
- **RecordStore:** the current records, a snapshot of them taken at load time, and the ids edited since.
- **View pipeline:** pure functions filtering, sorting and cutting the records into pages.
- **ItemReader / ItemWriter:** the seams between the session and the CSV codec, the sample generator or the logger.
- **Session:** the owned state a front end drives, one `&mut self` action per user gesture.

 ## Features

| **Feature**   | **Description**                                                  |
|---------------|------------------------------------------------------------------|
| fake          | Enables a sample book `ItemReader` and `Session::generate_sample` (default) |
| logger        | Enables a logger `ItemWriter`, useful for debugging purposes     |
| full          | Enables all available features                                   |

 ## Getting Started

```rust
use book_csv_editor::{
    core::{
        book::{BookField, BookPatch},
        session::Session,
        view::Filters,
    },
    error::EditorError,
};

fn main() -> Result<(), EditorError> {
    let csv = "Title,Author,Genre,PublishedYear,ISBN
The Great Gatsby,F. Scott Fitzgerald,Fiction,1925,978-0-7432-7356-5
Dune,Frank Herbert,Science Fiction,1965,
Emma,Jane Austen,Fiction,1815,";

    let mut session = Session::new();
    let summary = session.import_file("books.csv", csv.as_bytes().to_vec())?;
    assert_eq!(summary.loaded, 3);

    session.set_filters(Filters::default().genre("Fiction"));
    session.set_sort(BookField::PublishedYear);

    let page = session.view();
    assert_eq!(page.total_filtered, 2);
    assert_eq!(page.records[0].book.title, "Emma");

    let id = page.records[0].id;
    session.edit_record(id, &BookPatch::new().with(BookField::PublishedYear, "1816"))?;

    let export = session.export_csv()?;
    assert_eq!(export.file_name, "books_edited.csv");
    assert_eq!(export.count, 3);

    session.reset_all_edits();
    assert!(!session.is_modified(id));

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     (<http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     (<http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Records, the store, the view pipeline and the session
pub mod core;

/// Error types for editing operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of items readers / writers (csv codec, sample generator, logger)
pub mod item;
