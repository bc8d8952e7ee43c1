use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
};

use fake::{faker::name::raw::Name, locales::EN, Fake};
use log::debug;
use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};

use crate::core::{
    book::Book,
    item::{ItemReader, ItemReaderResult},
};

const ADJECTIVES: &[&str] = &[
    "Silent", "Crystal", "Forgotten", "Quantum", "Hidden", "Golden", "Crimson", "Eternal",
    "Ancient", "Mystic", "Silver", "Obsidian", "Emerald", "Sacred", "Winged", "Last",
    "Distant", "Burning", "Frozen", "Wandering",
];

const NOUNS: &[&str] = &[
    "Echo", "Prophecy", "Garden", "Kingdom", "Chronicle", "Portal", "Throne", "Compass",
    "Mirror", "Serpent", "Flame", "Valley", "Empire", "Scrolls", "Grove", "Tower", "Key",
    "Harbor", "Lantern", "Orchard",
];

const GENRES: &[&str] = &[
    "Fiction", "Science Fiction", "Fantasy", "Mystery", "Romance", "Thriller",
    "Historical Fiction", "Young Adult", "Horror", "Biography", "Memoir", "Self-Help",
    "Business", "Psychology", "Philosophy", "Science", "Technology", "Health", "Cooking",
    "Travel", "Art", "Music", "Sports", "Politics", "History", "Religion", "Spirituality",
    "Education", "Parenting", "Relationships",
];

const FIRST_YEAR: i32 = 1800;
const LAST_YEAR: i32 = 2024;

/// Draws per book before a repeated Title and Author pair is accepted.
const MAX_ATTEMPTS: usize = 10;

/// Uniform index below `bound`, 0 for an empty range.
fn below(rng: &mut StdRng, bound: usize) -> usize {
    Uniform::new(0, bound).map_or(0, |range| range.sample(rng))
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.get(below(rng, items.len())).copied().unwrap_or_default()
}

/// ISBN-13 `978-G-PPPPP-TTT-C` with a valid check digit.
fn fake_isbn(rng: &mut StdRng) -> String {
    let group = below(rng, 10);
    let publisher = below(rng, 100_000);
    let title = below(rng, 1_000);

    let digits = format!("978{group}{publisher:05}{title:03}");
    let sum: u32 = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, digit)| if i % 2 == 0 { digit } else { digit * 3 })
        .sum();
    let check = (10 - sum % 10) % 10;

    format!("978-{group}-{publisher:05}-{title:03}-{check}")
}

fn fake_year(rng: &mut StdRng) -> i32 {
    Uniform::new_inclusive(FIRST_YEAR, LAST_YEAR).map_or(FIRST_YEAR, |range| range.sample(rng))
}

/// A reader of synthetic but plausible books.
///
/// Titles pair an adjective with a noun, author names come from the `fake`
/// crate, years lie between 1800 and 2024 and every ISBN-13 carries a valid
/// check digit. A Title and Author pair already produced is redrawn up to ten
/// times, then accepted; large batches may therefore hold duplicates.
pub struct BookGenerator {
    count: Cell<usize>,
    rng: RefCell<StdRng>,
    seen: RefCell<HashSet<(String, String)>>,
}

impl BookGenerator {
    fn draw(&self) -> Book {
        let mut rng = self.rng.borrow_mut();
        let rng = &mut *rng;

        let title = format!("The {} {}", pick(rng, ADJECTIVES), pick(rng, NOUNS));
        let author: String = Name(EN).fake_with_rng(rng);

        Book::new(
            title,
            author,
            pick(rng, GENRES),
            fake_year(rng).to_string(),
            fake_isbn(rng),
        )
    }
}

impl ItemReader<Book> for BookGenerator {
    fn read(&self) -> ItemReaderResult<Book> {
        if self.count.get() == 0 {
            return Ok(None);
        }

        self.count.set(self.count.get() - 1);

        let mut book = self.draw();
        let mut seen = self.seen.borrow_mut();
        for _ in 1..MAX_ATTEMPTS {
            if !seen.contains(&(book.title.clone(), book.author.clone())) {
                break;
            }
            book = self.draw();
        }
        seen.insert((book.title.clone(), book.author.clone()));

        debug!("Book: {}", book);
        Ok(Some(book))
    }
}

#[derive(Default)]
pub struct BookGeneratorBuilder {
    number_of_items: usize,
    seed: Option<u64>,
}

impl BookGeneratorBuilder {
    pub fn new() -> BookGeneratorBuilder {
        BookGeneratorBuilder::default()
    }

    pub fn number_of_items(mut self, number_of_items: usize) -> BookGeneratorBuilder {
        self.number_of_items = number_of_items;
        self
    }

    /// Two generators built with the same seed yield the same books.
    pub fn seed(mut self, seed: u64) -> BookGeneratorBuilder {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> BookGenerator {
        BookGenerator {
            count: self.number_of_items.into(),
            rng: RefCell::new(StdRng::seed_from_u64(
                self.seed.unwrap_or_else(rand::random),
            )),
            seen: RefCell::new(HashSet::with_capacity(self.number_of_items)),
        }
    }
}

/// Generates `count` books, reproducibly when `seed` is given.
///
/// # Examples
///
/// ```
/// use book_csv_editor::item::fake::generate;
///
/// let books = generate(3, Some(42));
/// assert_eq!(books.len(), 3);
/// assert_eq!(books, generate(3, Some(42)));
/// ```
pub fn generate(count: usize, seed: Option<u64>) -> Vec<Book> {
    let builder = BookGeneratorBuilder::new().number_of_items(count);
    let generator = match seed {
        Some(seed) => builder.seed(seed),
        None => builder,
    }
    .build();

    std::iter::from_fn(|| generator.read().ok().flatten()).collect()
}
