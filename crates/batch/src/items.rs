//! Growable item source shared between an engine and its hooks.
//!
//! The executor re-reads the length before every "more work?" check, so a
//! hook that appends items (the next page of an unbounded job, say) keeps
//! the run going. Appended items land after everything already known.

use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to a shared, append-friendly list of work items.
///
/// Cloning the handle does not copy the items; all clones see the same list.
#[derive(Debug)]
pub struct SharedItems<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for SharedItems<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedItems<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for SharedItems<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(items)),
        }
    }
}

impl<T> SharedItems<T> {
    pub fn new() -> Self {
        Vec::new().into()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.lock().extend(items);
    }

    /// Sum of `weight` over every known item.
    pub fn total_weight(&self, weight: impl Fn(&T) -> usize) -> usize {
        self.lock().iter().map(weight).sum()
    }
}

impl<T: Clone> SharedItems<T> {
    pub fn get(&self, index: usize) -> Option<T> {
        self.lock().get(index).cloned()
    }

    /// Copy of the list as it is right now.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }
}
