// Identifier-based de-duplication of paginated book results

use std::collections::HashSet;

use parking_lot::Mutex;

use super::models::Book;

/// Ids of every book a feed store has shown, across all of its categories.
///
/// Owned by one store instance; nothing filters against it, it only records.
#[derive(Debug, Default)]
pub struct DedupContext {
    seen: Mutex<HashSet<String>>,
}

impl DedupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<'a>(&self, books: impl IntoIterator<Item = &'a Book>) {
        let mut seen = self.seen.lock();
        for book in books {
            seen.insert(book.id.clone());
        }
    }

    pub fn has_seen(&self, book_id: &str) -> bool {
        self.seen.lock().contains(book_id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().len()
    }
}

/// Drop repeated ids inside a single page, keeping first occurrences in order.
pub fn unique_page(page: Vec<Book>) -> Vec<Book> {
    let mut ids = HashSet::with_capacity(page.len());
    page.into_iter()
        .filter(|b| ids.insert(b.id.clone()))
        .collect()
}

/// Books of `page` whose ids are not in `existing` (nor earlier in `page`).
pub fn filter_new(existing: &[Book], page: Vec<Book>) -> Vec<Book> {
    let known: HashSet<&str> = existing.iter().map(|b| b.id.as_str()).collect();
    let mut taken = HashSet::new();
    page.into_iter()
        .filter(|b| !known.contains(b.id.as_str()) && taken.insert(b.id.clone()))
        .collect()
}
