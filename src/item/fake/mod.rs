/// A module providing a reader of generated sample books.
pub mod book_generator;

pub use book_generator::{generate, BookGenerator, BookGeneratorBuilder};
