#[cfg(feature = "logger")]
/// This module provides a logger item writer, useful to dump records while debugging.
pub mod logger;

/// This module provides the CSV book reader and writer.
pub mod csv;

#[cfg(feature = "fake")]
/// This module provides a reader of generated sample books.
pub mod fake;
