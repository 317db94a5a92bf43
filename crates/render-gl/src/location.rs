use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Per-program uniform location lookup, misses included.
///
/// Looked up through a shared pipeline reference, so the map lives behind a
/// `RefCell`.
#[derive(Debug)]
pub struct LocationCache<L> {
    entries: RefCell<HashMap<String, Option<L>>>,
    queries: Cell<u64>,
}

impl<L> Default for LocationCache<L> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            queries: Cell::new(0),
        }
    }
}

impl<L: Clone> LocationCache<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached location of `name`, calling `query` only the first time.
    pub fn get(&self, name: &str, query: impl FnOnce(&str) -> Option<L>) -> Option<L> {
        if let Some(cached) = self.entries.borrow().get(name) {
            return cached.clone();
        }
        self.queries.set(self.queries.get() + 1);
        let location = query(name);
        if location.is_none() {
            tracing::trace!(uniform = name, "uniform not active in program");
        }
        self.entries
            .borrow_mut()
            .insert(name.to_owned(), location.clone());
        location
    }

    /// Driver queries issued so far.
    pub fn queries(&self) -> u64 {
        self.queries.get()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
