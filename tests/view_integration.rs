mod common;

use book_csv_editor::core::{
    book::{parse_year, Book, BookField, BookRecord},
    view::{
        filter_and_sort, page_of, view, Filters, PageSize, SortConfig, SortDirection,
        UnparsedYears, ViewParameters,
    },
};
use common::{book, records, titles};
use proptest::prelude::*;

fn abc() -> Vec<BookRecord> {
    records(vec![book("A", "2000"), book("B", "1990"), book("C", "1990")])
}

#[test]
fn abc_sorted_by_year_should_page_as_bc_a_empty() {
    let records = abc();
    let mut params = ViewParameters {
        sort: SortConfig::by(BookField::PublishedYear, SortDirection::Asc),
        page_size: PageSize::Custom(2),
        ..ViewParameters::default()
    };

    let pages: Vec<Vec<String>> = (1..=3)
        .map(|page| {
            params.page = page;
            titles(view(&records, &params).records)
        })
        .collect();

    assert_eq!(pages, vec![vec!["B", "C"], vec!["A"], vec![]]);
}

#[test]
fn abc_from_1995_should_keep_only_a() {
    let records = abc();
    let params = ViewParameters {
        filters: Filters::default().year_from(1995),
        ..ViewParameters::default()
    };

    let page = view(&records, &params);

    assert_eq!(titles(page.records), vec!["A"]);
    assert_eq!(page.total_filtered, 1);
    assert_eq!(page.total_pages, 1);
}

#[test]
fn abc_descending_should_keep_ties_in_input_order() {
    let records = abc();
    let params = ViewParameters {
        sort: SortConfig::by(BookField::PublishedYear, SortDirection::Desc),
        ..ViewParameters::default()
    };

    assert_eq!(titles(view(&records, &params).records), vec!["A", "B", "C"]);
}

#[test]
fn nothing_matching_should_give_one_empty_page() {
    let records = abc();
    let params = ViewParameters {
        filters: Filters::default().search("zzz"),
        ..ViewParameters::default()
    };

    let page = view(&records, &params);

    assert!(page.records.is_empty());
    assert_eq!(page.total_filtered, 0);
    assert_eq!(page.total_pages, 1);
}

#[test]
fn large_store_should_page_by_chosen_size() {
    let records = records((0..10_000).map(|i| book(&format!("T{i:05}"), "2001")).collect());
    let params = ViewParameters {
        sort: SortConfig::by(BookField::Title, SortDirection::Desc),
        page: 40,
        page_size: PageSize::TwoHundredFifty,
        ..ViewParameters::default()
    };

    let page = view(&records, &params);

    assert_eq!(page.total_pages, 40);
    assert_eq!(page.records.len(), 250);
    assert_eq!(page.start_index, 9_750);
    assert_eq!(page.records[0].book.title, "T00249");
    assert_eq!(page.records[249].book.title, "T00000");
}

fn arb_book() -> impl Strategy<Value = Book> {
    (
        "[A-Ca-c ]{0,3}",
        "[a-c]{0,3}",
        prop::sample::select(vec!["", "Fiction", "Poetry", "fiction"]),
        prop::sample::select(vec!["", "1990", "2000", " 2010", "19x0", "-5"]),
        "[0-9X-]{0,4}",
    )
        .prop_map(|(title, author, genre, year, isbn)| Book::new(title, author, genre, year, isbn))
}

fn arb_records() -> impl Strategy<Value = Vec<BookRecord>> {
    prop::collection::vec(arb_book(), 0..40).prop_map(records)
}

fn arb_filters() -> impl Strategy<Value = Filters> {
    (
        "[a-cA-C]{0,2}",
        prop::sample::select(vec!["", "Fiction", "Poetry"]),
        prop::option::of(1985..2015i32),
        prop::option::of(1985..2015i32),
    )
        .prop_map(|(search, genre, year_from, year_to)| Filters {
            search,
            genre: genre.to_string(),
            year_from,
            year_to,
        })
}

fn arb_sort() -> impl Strategy<Value = SortConfig> {
    (
        prop::option::of(prop::sample::select(BookField::ALL.to_vec())),
        prop::bool::ANY,
    )
        .prop_map(|(key, desc)| SortConfig {
            key,
            direction: if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        })
}

fn arb_unparsed() -> impl Strategy<Value = UnparsedYears> {
    prop::sample::select(vec![UnparsedYears::Exclude, UnparsedYears::Include])
}

/// Straightforward restatement of the filter rules.
fn satisfies(book: &Book, filters: &Filters, unparsed: UnparsedYears) -> bool {
    let needle = filters.search.to_lowercase();
    let search = [&book.title, &book.author, &book.genre, &book.isbn]
        .iter()
        .any(|value| value.to_lowercase().contains(&needle));
    let genre = filters.genre.is_empty() || book.genre == filters.genre;
    let years = if filters.year_from.is_none() && filters.year_to.is_none() {
        true
    } else {
        match parse_year(&book.published_year) {
            Some(year) => {
                filters.year_from.is_none_or(|from| year >= from)
                    && filters.year_to.is_none_or(|to| year <= to)
            }
            None => unparsed == UnparsedYears::Include,
        }
    };
    search && genre && years
}

fn sort_text(book: &Book, field: BookField) -> String {
    book.get(field).to_lowercase()
}

proptest! {
    #[test]
    fn filtered_records_should_satisfy_filters(
        records in arb_records(),
        filters in arb_filters(),
        sort in arb_sort(),
        unparsed in arb_unparsed(),
    ) {
        let ordered = filter_and_sort(&records, &filters, &sort, unparsed);

        prop_assert!(ordered.len() <= records.len());
        for &index in &ordered {
            prop_assert!(satisfies(&records[index].book, &filters, unparsed));
        }
        let expected = records
            .iter()
            .filter(|record| satisfies(&record.book, &filters, unparsed))
            .count();
        prop_assert_eq!(ordered.len(), expected);
    }

    #[test]
    fn sort_should_be_ordered_and_stable(
        records in arb_records(),
        field in prop::sample::select(BookField::ALL.to_vec()),
        desc in prop::bool::ANY,
    ) {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        let ordered = filter_and_sort(
            &records,
            &Filters::default(),
            &SortConfig::by(field, direction),
            UnparsedYears::Exclude,
        );

        for pair in ordered.windows(2) {
            let (a, b) = (&records[pair[0]].book, &records[pair[1]].book);
            let ordering = if field == BookField::PublishedYear {
                a.year().unwrap_or(0).cmp(&b.year().unwrap_or(0))
            } else {
                sort_text(a, field).cmp(&sort_text(b, field))
            };
            let ordering = if desc { ordering.reverse() } else { ordering };

            prop_assert!(ordering.is_le());
            if ordering.is_eq() {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn pages_should_cover_the_ordered_sequence(
        records in arb_records(),
        filters in arb_filters(),
        sort in arb_sort(),
        size in 1usize..8,
    ) {
        let ordered = filter_and_sort(&records, &filters, &sort, UnparsedYears::Exclude);
        let page_size = PageSize::Custom(size);
        let total_pages = page_of(&records, &ordered, 1, page_size).total_pages;

        prop_assert_eq!(total_pages, ordered.len().div_ceil(size).max(1));

        let concatenated: Vec<u64> = (1..=total_pages)
            .flat_map(|page| page_of(&records, &ordered, page, page_size).records)
            .map(|record| record.id.0)
            .collect();
        let expected: Vec<u64> = ordered.iter().map(|&index| records[index].id.0).collect();

        prop_assert_eq!(concatenated, expected);
        prop_assert!(page_of(&records, &ordered, total_pages + 1, page_size).records.is_empty());
    }
}
