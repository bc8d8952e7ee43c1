#![allow(dead_code)]

mod mocks;

pub use mocks::MockFile;

use book_csv_editor::core::{
    book::{Book, BookId, BookRecord},
    session::Session,
};

pub const HEADER: &str = "Title,Author,Genre,PublishedYear,ISBN";

/// Three books: A (2000), B (1990), C (1990), in that order.
pub const ABC_CSV: &str = "Title,Author,Genre,PublishedYear,ISBN
A,Ann Archer,Fiction,2000,
B,Bob Brown,Poetry,1990,0-306-40615-2
C,Cid Clark,Fiction,1990,978-0-7432-7356-5
";

pub fn abc_session() -> Session {
    let mut session = Session::new();
    session
        .import_file("books.csv", ABC_CSV.as_bytes().to_vec())
        .expect("fixture import should succeed");
    session
}

pub fn book(title: &str, year: &str) -> Book {
    Book::new(title, "Some Author", "Fiction", year, "")
}

pub fn records(books: Vec<Book>) -> Vec<BookRecord> {
    books
        .into_iter()
        .enumerate()
        .map(|(i, book)| BookRecord::new(BookId(i as u64), book))
        .collect()
}

pub fn titles<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a BookRecord>,
{
    records
        .into_iter()
        .map(|record| record.book.title.clone())
        .collect()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
