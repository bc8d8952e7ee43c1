use std::env::temp_dir;

use book_csv_editor::{
    core::{
        book::{BookField, BookPatch},
        item::ItemWriter,
        session::SessionBuilder,
        view::Filters,
    },
    error::EditorError,
    item::logger::LoggerWriter,
};

fn main() -> Result<(), EditorError> {
    env_logger::init();

    let mut session = SessionBuilder::new().sample_seed(42).build();
    session.generate_sample(1_000)?;

    session.set_filters(Filters::default().genre("Fantasy").year_from(1900));
    session.set_sort(BookField::PublishedYear);

    let first = session.view().records.first().map(|record| record.id);
    if let Some(id) = first {
        session.edit_record(
            id,
            &BookPatch::new()
                .with(BookField::Title, "The Edited Chronicle")
                .with(BookField::Isbn, "0-306-40615-2"),
        )?;
    }

    let stats = session.stats();
    println!(
        "{} books, {} shown on {} pages, {} modified",
        stats.total, stats.filtered, stats.pages, stats.modified
    );

    let logger = LoggerWriter::default();
    logger.write(&session.view().records)?;

    let export = session.export_csv()?;
    let path = temp_dir().join(&export.file_name);
    std::fs::write(&path, &export.contents)
        .map_err(|error| EditorError::ItemWriter(error.to_string()))?;
    println!("{} books written to {}", export.count, path.display());

    Ok(())
}
