// Release-date views over a list of books (normally the favorites)

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::domain::models::Book;

fn unique_dated<'a>(books: &'a [Book]) -> impl Iterator<Item = (&'a Book, NaiveDate)> + 'a {
    let mut seen = HashSet::new();
    books
        .iter()
        .filter(move |b| {
            let book: &'a Book = *b;
            seen.insert(book.id.as_str())
        })
        .filter_map(|b| b.published_date.map(|d| (b, d)))
}

/// Every date on which at least one of `books` is released. Undated books are skipped.
pub fn release_dates(books: &[Book]) -> BTreeSet<NaiveDate> {
    unique_dated(books).map(|(_, d)| d).collect()
}

pub fn releasing_on(books: &[Book], date: NaiveDate) -> Vec<Book> {
    unique_dated(books)
        .filter(|(_, d)| *d == date)
        .map(|(b, _)| b.clone())
        .collect()
}

/// Books released on or after `from`, earliest first; ties keep input order.
pub fn upcoming(books: &[Book], from: NaiveDate) -> Vec<Book> {
    let mut dated: Vec<(&Book, NaiveDate)> = unique_dated(books).filter(|(_, d)| *d >= from).collect();
    dated.sort_by_key(|(_, d)| *d);
    dated.into_iter().map(|(b, _)| b.clone()).collect()
}
