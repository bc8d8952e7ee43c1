use std::fmt::Debug;

use log::info;

use crate::core::item::{ItemWriter, ItemWriterResult};

/// A writer that logs every item it is given, one `info` line per item.
///
/// Handy to dump a page of the view or the books of an import while
/// debugging; nothing is kept.
#[derive(Default)]
pub struct LoggerWriter {}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, items: &[T]) -> ItemWriterResult {
        items.iter().for_each(|item| info!("Record:{:?}", item));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LoggerWriter;
    use crate::core::{
        book::{Book, BookId, BookRecord},
        item::ItemWriter,
    };

    #[test]
    fn any_debug_item_should_be_accepted() {
        let writer = LoggerWriter::default();

        assert!(writer.write(&[Book::new("Emma", "Jane Austen", "Fiction", "1815", "")]).is_ok());
        assert!(writer
            .write(&[BookRecord::new(BookId(1), Book::default())])
            .is_ok());
        assert!(ItemWriter::<Book>::flush(&writer).is_ok());
    }
}
