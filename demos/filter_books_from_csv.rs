use std::{env, fs};

use anyhow::Context;
use book_csv_editor::{
    core::{
        book::BookField,
        session::Session,
        view::{page_window, Filters},
    },
    item::csv::SAMPLE_CSV,
};

/// Usage: filter_books_from_csv [FILE.csv] [SEARCH]
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (name, bytes) = match args.next() {
        Some(path) => {
            let bytes = fs::read(&path).with_context(|| format!("cannot read {}", path))?;
            (path, bytes)
        }
        None => ("sample.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec()),
    };

    let mut session = Session::new();
    let summary = session.import_file(&name, bytes)?;
    for warning in &summary.warnings {
        eprintln!("warning: {}", warning);
    }

    if let Some(search) = args.next() {
        session.set_filters(Filters::default().search(search));
    }
    session.set_sort(BookField::Title);

    let page = session.view();
    for (offset, record) in page.records.iter().enumerate() {
        println!("{:>5}  {}", page.start_index + offset + 1, record.book);
    }

    let pages: Vec<String> = page_window(page.page, page.total_pages, 5)
        .map(|page| page.to_string())
        .collect();
    println!(
        "{} of {} books, page {} of {} [{}]",
        page.total_filtered,
        session.stats().total,
        page.page,
        page.total_pages,
        pages.join(" ")
    );

    Ok(())
}
