//! Publish-once slots.
//!
//! Every lazily derived artifact of an entity (early annotation data,
//! annotation bag, member tables, phase results) lives in a `PublishOnce`.
//! Computations run outside any lock; the first value offered wins and every
//! later offer is discarded together with whatever diagnostics it carried.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Outcome of offering a value to a [`PublishOnce`].
pub struct Published<T> {
    /// The value every reader observes from now on.
    pub value: Arc<T>,
    /// `true` if the offered value became the published one.
    pub won: bool,
}

pub struct PublishOnce<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> PublishOnce<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    #[inline]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    #[inline]
    pub fn is_published(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Offer `value`. Returns the winner, which is `value` only if nothing
    /// was published before.
    pub fn publish(&self, value: T) -> Published<T> {
        let candidate = Arc::new(value);
        let mut won = false;
        let winner = self.cell.get_or_init(|| {
            won = true;
            Arc::clone(&candidate)
        });
        if !won {
            trace!(
                type_name = std::any::type_name::<T>(),
                "publish race lost; discarding computed value"
            );
        }
        Published {
            value: Arc::clone(winner),
            won,
        }
    }

    /// Return the published value, computing and offering one first if
    /// nothing is published yet.
    ///
    /// `compute` runs without holding any lock, so it may itself read other
    /// `PublishOnce` slots. Two racing callers may both compute; only one
    /// result is ever observable.
    pub fn get_or_publish(&self, compute: impl FnOnce() -> T) -> Published<T> {
        if let Some(existing) = self.cell.get() {
            return Published {
                value: Arc::clone(existing),
                won: false,
            };
        }
        self.publish(compute())
    }
}

impl<T> Default for PublishOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PublishOnce<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("PublishOnce").field(value).finish(),
            None => f.write_str("PublishOnce(<unpublished>)"),
        }
    }
}

#[cfg(test)]
#[path = "../tests/publish_tests.rs"]
mod tests;
